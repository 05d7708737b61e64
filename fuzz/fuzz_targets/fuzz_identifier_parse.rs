#![no_main]

use libfuzzer_sys::fuzz_target;
use tscope_core::identifier::Identifier;

fuzz_target!(|raw: &str| {
    let Ok(id) = Identifier::new(raw) else {
        assert!(raw.is_empty() || raw.split('.').any(str::is_empty));
        return;
    };
    assert_eq!(id.as_str(), raw);
    assert_eq!(id.segments().count(), raw.split('.').count());
    assert!(id.segments().all(|s| !s.is_empty()));

    let prefixes: Vec<_> = id.prefixes().collect();
    assert_eq!(prefixes.last().copied(), Some(raw));

    if let Some(first) = id.segments().next() {
        let first = first.to_string();
        let replaced = id.replace_segment(&first, "x").expect("segment present");
        assert!(!replaced.contains_segment(&first) || first == "x");
    }
});
