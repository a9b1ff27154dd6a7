//! End-to-end acceptance tests, one per seed scenario.

use gerber::aperture::Aperture;
use gerber::macros::MacroPrimitive;
use gerber::object::GraphicalObject;
use gerber::state::{ApertureId, Point, Polarity};
use gerber::{ErrorKind, GerberLayer};

use assert_matches::assert_matches;
use indoc::indoc;

fn header() -> &'static str {
    "%FSLAX26Y26*%\n%MOMM*%\n"
}

#[test]
fn two_line_draw() {
    let src = format!(
        "{}{}",
        header(),
        indoc! {"
            %ADD100C,1.5*%
            D100*
            G01*
            X0Y0D02*
            X2512000Y115000D01*
            M02*
        "}
    );
    let layer = GerberLayer::parse(&src).unwrap();
    assert_eq!(layer.objects.len(), 1);
    match &layer.objects[0] {
        GraphicalObject::Draw {
            origin,
            endpoint,
            transform_snapshot,
            aperture_snapshot,
        } => {
            assert_eq!(*origin, Point { x: 0, y: 0 });
            assert_eq!(*endpoint, Point { x: 2_512_000, y: 115_000 });
            assert_eq!(transform_snapshot.polarity, Polarity::Dark);
            match aperture_snapshot.as_ref() {
                Aperture::Circle { diameter, .. } => assert_eq!(*diameter, 1.5),
                other => panic!("expected Circle, got {other:?}"),
            }
        }
        other => panic!("expected Draw, got {other:?}"),
    }
}

#[test]
fn cw_arc() {
    let src = format!(
        "{}{}",
        header(),
        indoc! {"
            %ADD100C,1.5*%
            D100*
            G02*
            X0Y0D02*
            X5005000Y3506000I3000J0D01*
            M02*
        "}
    );
    let layer = GerberLayer::parse(&src).unwrap();
    assert_eq!(layer.objects.len(), 1);
    match &layer.objects[0] {
        GraphicalObject::Arc {
            endpoint,
            offset,
            is_cw,
            ..
        } => {
            assert_eq!(*endpoint, Point { x: 5_005_000, y: 3_506_000 });
            assert_eq!(*offset, (3000, 0));
            assert!(*is_cw);
        }
        other => panic!("expected Arc, got {other:?}"),
    }
}

#[test]
fn polarity_snapshot_survives_later_changes() {
    let src = format!(
        "{}{}",
        header(),
        indoc! {"
            %ADD100C,1.0*%
            D100*
            X0Y0D03*
            %LPC*%
            X1000000Y0D03*
            %LPD*%
            M02*
        "}
    );
    let layer = GerberLayer::parse(&src).unwrap();
    assert_eq!(layer.objects.len(), 2);
    let polarities: Vec<Polarity> = layer
        .objects
        .iter()
        .map(|o| match o {
            GraphicalObject::Flash { transform_snapshot, .. } => transform_snapshot.polarity,
            other => panic!("expected Flash, got {other:?}"),
        })
        .collect();
    assert_eq!(polarities, vec![Polarity::Dark, Polarity::Clear]);
}

#[test]
fn region_with_two_contours() {
    let src = format!(
        "{}{}",
        header(),
        indoc! {"
            G36*
            X100000Y100000D02*
            X500000Y100000D01*
            X300000Y400000D01*
            X100000Y100000D01*
            X0Y200000D02*
            X0Y400000D01*
            X200000Y400000D01*
            X200000Y200000D01*
            X0Y200000D01*
            G37*
            M02*
        "}
    );
    let layer = GerberLayer::parse(&src).unwrap();
    assert_eq!(layer.objects.len(), 1);
    match &layer.objects[0] {
        GraphicalObject::Region { segments, contours, .. } => {
            assert_eq!(segments.len(), 7);
            assert_eq!(contours, &vec![(0, 3), (3, 4)]);
        }
        other => panic!("expected Region, got {other:?}"),
    }
}

#[test]
fn macro_with_variable() {
    let src = format!(
        "{}{}",
        header(),
        indoc! {"
            %AMDONUTVAR*1,1,$1,$2,$3*1,0,$4,$2,$3*%
            %ADD34DONUTVAR,0.100X0X0X0.080*%
            M02*
        "}
    );
    let layer = GerberLayer::parse(&src).unwrap();
    let aperture = layer.apertures.get(ApertureId(34)).unwrap();
    match aperture.as_ref() {
        Aperture::Macro { primitives, .. } => {
            assert_eq!(primitives.len(), 2);
            match &primitives[0] {
                MacroPrimitive::Circle { exposure, diameter, x, y, .. } => {
                    assert!(exposure);
                    assert_eq!(*diameter, 0.100);
                    assert_eq!(*x, 0.0);
                    assert_eq!(*y, 0.0);
                }
                other => panic!("expected Circle, got {other:?}"),
            }
            match &primitives[1] {
                MacroPrimitive::Circle { exposure, diameter, .. } => {
                    assert!(!exposure);
                    assert_eq!(*diameter, 0.080);
                }
                other => panic!("expected Circle, got {other:?}"),
            }
        }
        other => panic!("expected Macro aperture, got {other:?}"),
    }
}

#[test]
fn nested_block_aperture() {
    let src = format!(
        "{}{}",
        header(),
        indoc! {"
            %ADD100R,0.5X0.5*%
            %ABD102*%
            %ABD101*%
            D100*
            X0Y0D03*
            X1000000Y0D03*
            X0Y1000000D03*
            X1000000Y1000000D03*
            %AB*%
            D101*
            X0Y0D03*
            X2000000Y0D03*
            X4000000Y0D03*
            X0Y2000000D03*
            X2000000Y2000000D03*
            X4000000Y2000000D03*
            %AB*%
            M02*
        "}
    );
    let layer = GerberLayer::parse(&src).unwrap();
    assert!(layer.objects.is_empty());

    let d101 = layer.apertures.get(ApertureId(101)).unwrap();
    let d102 = layer.apertures.get(ApertureId(102)).unwrap();

    match d101.as_ref() {
        Aperture::Block { objects } => assert_eq!(objects.len(), 4),
        other => panic!("expected Block, got {other:?}"),
    }

    match d102.as_ref() {
        Aperture::Block { objects } => {
            assert_eq!(objects.len(), 6);
            for object in objects.iter() {
                match object {
                    GraphicalObject::Flash { aperture_snapshot, .. } => {
                        assert!(std::rc::Rc::ptr_eq(aperture_snapshot, &d101));
                    }
                    other => panic!("expected Flash, got {other:?}"),
                }
            }
        }
        other => panic!("expected Block, got {other:?}"),
    }
}

#[test]
fn expression_evaluation_rejects_illegal_syntax() {
    assert_eq!(gerber::expr::eval("(1.25-1.0)x2").unwrap(), 0.5);
    assert_matches!(gerber::expr::eval("1.25*2"), Err(ErrorKind::Macro(_)));
    assert_matches!(gerber::expr::eval("import sys"), Err(ErrorKind::Macro(_)));
}

#[test]
fn missing_eof_marker_is_rejected() {
    let src = header();
    let err = GerberLayer::parse(src).unwrap_err();
    assert_matches!(err.kind, ErrorKind::EofMissing);
}
