#![no_main]

use libfuzzer_sys::fuzz_target;
use tabwire_core::{Location, Route};

const BASE: &str = "https://app.test/section/page?x=1#top";

fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };

    if let Ok(location) = Location::parse(text) {
        let route = Route::from_location(&location);
        assert!(route.query.as_deref() != Some(""), "empty query must be absent");
        assert!(route.fragment.as_deref() != Some(""), "empty fragment must be absent");
        let _ = route.to_string();
    }

    // Anchor hrefs are resolved against the current location.
    if let Ok(resolved) = Location::resolve(BASE, text) {
        let route = Route::from_location(&resolved);
        assert!(route.userinfo.is_none());
        let again = Route::parse(&resolved.href).expect("resolved href reparses");
        assert_eq!(again, route);
    }
});
