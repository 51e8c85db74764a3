//! SI quantities at the boundary of the solver. Internally everything is
//! plain `f64` in SI base units.

use uom::si::f64::{
    Length as UomLength, MassRate as UomMassRate, Power as UomPower, Pressure as UomPressure,
    ThermodynamicTemperature as UomThermodynamicTemperature,
};

pub type Length = UomLength;
pub type MassRate = UomMassRate;
pub type Power = UomPower;
pub type Pressure = UomPressure;
pub type Temperature = UomThermodynamicTemperature;

#[inline]
pub fn pa(v: f64) -> Pressure {
    use uom::si::pressure::pascal;
    Pressure::new::<pascal>(v)
}

#[inline]
pub fn k(v: f64) -> Temperature {
    use uom::si::thermodynamic_temperature::kelvin;
    Temperature::new::<kelvin>(v)
}

#[inline]
pub fn degc(v: f64) -> Temperature {
    use uom::si::thermodynamic_temperature::degree_celsius;
    Temperature::new::<degree_celsius>(v)
}

#[inline]
pub fn kgps(v: f64) -> MassRate {
    use uom::si::mass_rate::kilogram_per_second;
    MassRate::new::<kilogram_per_second>(v)
}

#[inline]
pub fn m(v: f64) -> Length {
    use uom::si::length::meter;
    Length::new::<meter>(v)
}

#[inline]
pub fn mm(v: f64) -> Length {
    use uom::si::length::millimeter;
    Length::new::<millimeter>(v)
}

#[inline]
pub fn watts(v: f64) -> Power {
    use uom::si::power::watt;
    Power::new::<watt>(v)
}

pub mod constants {
    pub const G0_MPS2: f64 = 9.806_65;

    /// Stefan-Boltzmann constant, W/m^2-K^4.
    pub const STEFAN_BOLTZMANN: f64 = 5.670_374_419e-8;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constructors_store_si_values() {
        assert!((pa(101_325.0).value - 101_325.0).abs() < 1e-9);
        assert!((kgps(1.2).value - 1.2).abs() < 1e-15);
        assert!((k(573.15).value - 573.15).abs() < 1e-12);
        assert!((degc(300.0).value - 573.15).abs() < 1e-9);
        assert!((mm(8.0).value - 0.008).abs() < 1e-15);
        assert!((m(2.0).value - 2.0).abs() < 1e-15);
        assert!((watts(1.5e6).value - 1.5e6).abs() < 1e-9);
    }
}
