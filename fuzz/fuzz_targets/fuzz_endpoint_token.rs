#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use tabwire_runtime::Endpoint;

#[derive(Debug, Arbitrary)]
struct Input {
    endpoint: String,
    param: String,
    token: String,
}

fuzz_target!(|input: Input| {
    let Ok(endpoint) = Endpoint::parse(&input.endpoint) else {
        return;
    };
    if input.param.is_empty() {
        return;
    }

    // Whatever the token contains, it must survive as exactly one query pair.
    let dialed = endpoint.with_token(&input.param, &input.token);
    let url = url::Url::parse(&dialed).expect("token url parses");
    let pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();
    assert_eq!(pairs, vec![(input.param.clone(), input.token.clone())]);
    assert!(url.fragment().is_none());
});
