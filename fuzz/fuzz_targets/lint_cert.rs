#![no_main]

use libfuzzer_sys::fuzz_target;
use std::sync::OnceLock;
use xlint_lib::{parse_cert, Engine, LintConfig, Registry};

static REGISTRY: OnceLock<Option<Registry>> = OnceLock::new();

fuzz_target!(|data: &[u8]| {
    // Neither the parser nor any lint may panic, regardless of input.
    let Some(registry) = REGISTRY.get_or_init(|| Registry::builtin().ok()) else {
        return;
    };
    if let Ok(cert) = parse_cert(data) {
        let results = Engine::new(registry).run(&cert, &LintConfig::default());
        assert_eq!(results.internal_errors().count(), 0);
        assert_eq!(results.len(), registry.len());

        let _ = cert.fingerprint_sha256();
        let _ = xlint_lib::rdn_sequence_whitespace(&cert.subject.raw);
        let _ = xlint_lib::display_results(&results, false);
        let _ = xlint_lib::to_json(&results);
        let _ = xlint_lib::to_json(&cert);
    }
});
