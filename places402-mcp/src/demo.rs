//! Canned search results shown in demo mode.

use std::sync::LazyLock;

use crate::payload::Place;

/// Location shown when a demo search has no location.
pub const DEMO_LOCATION: &str = "San Francisco (demo)";

static DEMO_PLACES: LazyLock<Vec<Place>> = LazyLock::new(|| {
    vec![
        demo_place(
            "Blue Bottle Coffee",
            "66 Mint St, San Francisco, CA 94103, USA",
            4.1,
            "(510) 653-3394",
        ),
        demo_place(
            "Philz Coffee",
            "3101 24th St, San Francisco, CA 94110, USA",
            4.3,
            "(415) 875-9943",
        ),
        demo_place(
            "Sightglass Coffee",
            "270 7th St, San Francisco, CA 94103, USA",
            4.2,
            "(415) 861-1313",
        ),
    ]
});

fn demo_place(name: &str, address: &str, rating: f64, phone: &str) -> Place {
    Place {
        name: Some(name.to_owned()),
        formatted_address: Some(address.to_owned()),
        rating: Some(rating),
        price_level: Some(2),
        types: Some(
            ["cafe", "food", "point_of_interest", "store"]
                .map(str::to_owned)
                .to_vec(),
        ),
        formatted_phone_number: Some(phone.to_owned()),
        business_status: Some("OPERATIONAL".to_owned()),
        opening_hours: None,
    }
}

/// The fixed demo dataset.
#[must_use]
pub fn demo_places() -> &'static [Place] {
    &DEMO_PLACES
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dataset_is_three_coffee_shops() {
        let names: Vec<_> = demo_places()
            .iter()
            .filter_map(|p| p.name.as_deref())
            .collect();
        assert_eq!(
            names,
            ["Blue Bottle Coffee", "Philz Coffee", "Sightglass Coffee"]
        );
        assert!(demo_places().iter().all(|p| p.price_level == Some(2)));
    }
}
