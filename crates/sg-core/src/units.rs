// sg-core/src/units.rs

use uom::si::f64::{Area as UomArea, Length as UomLength, Volume as UomVolume};

// Public canonical unit types (SI, f64)
pub type Area = UomArea;
pub type Length = UomLength;
pub type Volume = UomVolume;

/// International acre (43 560 sq ft). uom's `acre` is the US survey acre.
#[inline]
pub fn acres(v: f64) -> Area {
    sq_ft(v * constants::SQFT_PER_ACRE)
}

#[inline]
pub fn sq_ft(v: f64) -> Area {
    use uom::si::area::square_foot;
    Area::new::<square_foot>(v)
}

#[inline]
pub fn inches(v: f64) -> Length {
    use uom::si::length::inch;
    Length::new::<inch>(v)
}

#[inline]
pub fn feet(v: f64) -> Length {
    use uom::si::length::foot;
    Length::new::<foot>(v)
}

#[inline]
pub fn in_acres(a: Area) -> f64 {
    in_sq_ft(a) / constants::SQFT_PER_ACRE
}

#[inline]
pub fn in_sq_ft(a: Area) -> f64 {
    use uom::si::area::square_foot;
    a.get::<square_foot>()
}

/// Acre-feet on the international acre.
#[inline]
pub fn in_acre_feet(v: Volume) -> f64 {
    use uom::si::volume::cubic_foot;
    v.get::<cubic_foot>() / constants::SQFT_PER_ACRE
}

/// Facility footprint per unit of segment area, in square feet per acre.
#[inline]
pub fn sqft_per_acre(footprint: Area, segment: Area) -> f64 {
    in_sq_ft(footprint) / in_acres(segment)
}

/// Volume of a uniform depth over an area, in acre-feet.
#[inline]
pub fn depth_volume_acft(depth: Length, area: Area) -> f64 {
    in_acre_feet(area * depth)
}

pub mod constants {
    pub const SQFT_PER_ACRE: f64 = 43_560.0;
    pub const INCHES_PER_FOOT: f64 = 12.0;
}
