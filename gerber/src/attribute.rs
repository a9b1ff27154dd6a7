//! File and object attributes (`%TF`, `%TA`, `%TO`, `%TD`).
//!
//! These carry metadata (net names, part numbers, file function) that a
//! downstream consumer might want, but the core scene graph has no use for
//! them: they are accepted wherever they appear and otherwise ignored, per
//! the dispatch table. This module exists as the single place that fact is
//! recorded, rather than scattering magic string prefixes through the
//! dispatcher.

/// True if `payload` (the extended-statement body, `*` included) is one of
/// the four attribute statement codes.
pub(crate) fn is_attribute(payload: &str) -> bool {
    payload.starts_with("TF")
        || payload.starts_with("TA")
        || payload.starts_with("TO")
        || payload.starts_with("TD")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recognizes_all_four_attribute_codes() {
        assert!(is_attribute("TF.Part,Single*"));
        assert!(is_attribute("TA.AperFunction,ViaPad*"));
        assert!(is_attribute("TO.N,GND*"));
        assert!(is_attribute("TD*"));
        assert!(!is_attribute("FSLAX26Y26*"));
    }
}
