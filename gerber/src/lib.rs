//! Parse RS-274X ("Gerber") PCB image files into a resolved object stream.
//!
//! ## Implementation notes
//!
//! Ucamco's own grammar is close to a PEG, which makes a `nom` parser-
//! combinator attractive for the *tokens* inside a statement: numbers,
//! names, aperture identifiers. It is a poor fit for the statement grammar
//! itself, because Gerber is not context-free (`D01` means something
//! different inside a region than outside one, region contours are
//! inferred from cross-statement endpoint continuity, and aperture blocks
//! and step-and-repeat groups nest an arbitrary collector stack). A flat
//! `alt()` over every statement shape cannot express that without smuggling
//! mutable state through combinator closures.
//!
//! So this crate splits the problem the way a hand-written parser for a
//! stateful protocol usually does: [`lexer`] finds statement boundaries
//! (terminated by `*`, optionally wrapped in a multi-line `%...%` region)
//! and [`parser`] dispatches each statement by its command code to a
//! handler that mutates the running [`state::ModalState`] and the
//! [`builder::ObjectBuilder`] stack. `nom` stays exactly where it already
//! earns its keep, in [`tokens`].
//!
//! ## Layout
//!
//! - [`lexer`], statement splitting.
//! - [`tokens`], `nom` combinators for numbers, names, identifiers.
//! - [`state`], modal parser state carried across statements.
//! - [`expr`], the arithmetic expression evaluator for macro bodies.
//! - [`macros`], macro template instantiation.
//! - [`aperture`], aperture templates and the aperture table.
//! - [`object`], the graphical-object sum type.
//! - [`builder`], the collector stack that assembles the object stream.
//! - [`attribute`], `TF`/`TA`/`TO`/`TD` attribute statements (ignored).
//! - [`parser`], statement dispatch and [`GerberLayer::parse`].
//! - [`error`], the error taxonomy.

mod attribute;
mod builder;
mod lexer;
mod parser;
mod tokens;

pub mod aperture;
pub mod error;
pub mod expr;
pub mod macros;
pub mod object;
pub mod state;

pub use error::{Error, ErrorKind, Result};
pub use parser::GerberLayer;

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use indoc::indoc;

    #[test]
    fn parses_two_line_draw() {
        let src = indoc! {"
            %FSLAX26Y26*%
            %MOMM*%
            %ADD10C,0.100000*%
            D10*
            G01*
            X0Y0D02*
            X5000000Y0D01*
            M02*
        "};
        let layer = GerberLayer::parse(src).unwrap();
        assert_eq!(layer.objects.len(), 1);
    }

    #[test]
    fn rejects_input_missing_end_of_file_marker() {
        let src = indoc! {"
            %FSLAX26Y26*%
            %MOMM*%
        "};
        let err = GerberLayer::parse(src).unwrap_err();
        assert_matches!(err.kind, ErrorKind::EofMissing);
    }
}
