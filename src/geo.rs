use crate::jobs::Coords;

/// Mean Earth radius in miles
pub const EARTH_RADIUS_MILES: f64 = 3958.8;

/// Great-circle distance between two points in miles, rounded to one decimal.
pub fn distance_miles(from: Coords, to: Coords) -> f64 {
    let lat1 = from.lat.to_radians();
    let lat2 = to.lat.to_radians();
    let d_lat = lat2 - lat1;
    let d_lon = (to.lon - from.lon).to_radians();

    let a = (d_lat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (d_lon / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    (EARTH_RADIUS_MILES * c * 10.0).round() / 10.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_point_is_zero() {
        let p = Coords::new(40.7128, -74.0060);
        assert_eq!(distance_miles(p, p), 0.0);
    }

    #[test]
    fn new_york_to_philadelphia() {
        let nyc = Coords::new(40.7128, -74.0060);
        let philly = Coords::new(39.9526, -75.1652);
        let d = distance_miles(nyc, philly);
        assert!((d - 80.5).abs() < 0.2, "got {}", d);
    }

    #[test]
    fn symmetric() {
        let a = Coords::new(42.36, -71.06);
        let b = Coords::new(41.82, -71.41);
        assert_eq!(distance_miles(a, b), distance_miles(b, a));
    }
}
