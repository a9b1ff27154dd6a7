//! Aperture template registry and aperture table, per §3/§4.4.

use std::collections::HashMap;
use std::rc::Rc;

use crate::error::ErrorKind;
use crate::macros::{self, MacroPrimitive, MacroTemplate};
use crate::object::GraphicalObject;
use crate::state::ApertureId;

/// A concrete, resolved aperture: either a built-in shape template with its
/// parameters, a macro aperture with its already-evaluated primitives, or a
/// block aperture (a sub-scene flashed as a group).
#[derive(Debug, Clone, PartialEq)]
pub enum Aperture {
    Circle {
        diameter: f64,
        hole: Option<f64>,
    },
    Rectangle {
        x_size: f64,
        y_size: f64,
        hole: Option<f64>,
    },
    Obround {
        x_size: f64,
        y_size: f64,
        hole: Option<f64>,
    },
    Polygon {
        outer_diameter: f64,
        vertices: u8,
        rotation: f64,
        hole: Option<f64>,
    },
    Macro {
        template_name: String,
        primitives: Vec<MacroPrimitive>,
    },
    Block {
        objects: Rc<Vec<GraphicalObject>>,
    },
}

/// A shared, immutable handle to a resolved aperture. Apertures never
/// mutate after definition, so snapshots can cheaply share one by
/// reference instead of deep-cloning it (relevant for recursive
/// `Aperture::Block` values).
pub type ApertureRef = Rc<Aperture>;

/// Registry of user-defined macro templates, keyed by template name.
/// Built-in templates (`C`, `R`, `O`, `P`) never appear here; they are
/// recognized structurally by [`parse_builtin_params`].
#[derive(Debug, Clone, Default)]
pub struct TemplateRegistry {
    templates: HashMap<String, MacroTemplate>,
}

impl TemplateRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn define(&mut self, name: &str, body: String) -> Result<(), ErrorKind> {
        if self.templates.contains_key(name) {
            return Err(ErrorKind::DuplicateAperture(format!(
                "macro template '{name}' already defined"
            )));
        }
        self.templates.insert(name.to_string(), MacroTemplate { body });
        Ok(())
    }

    pub(crate) fn get(&self, name: &str) -> Option<&MacroTemplate> {
        self.templates.get(name)
    }
}

/// Maps aperture identifiers to their resolved aperture.
#[derive(Debug, Clone, Default)]
pub struct ApertureTable {
    apertures: HashMap<ApertureId, ApertureRef>,
}

impl ApertureTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn define(&mut self, id: ApertureId, aperture: Aperture) -> Result<(), ErrorKind> {
        if self.apertures.contains_key(&id) {
            return Err(ErrorKind::DuplicateAperture(format!("aperture {id} already defined")));
        }
        self.apertures.insert(id, Rc::new(aperture));
        Ok(())
    }

    pub fn get(&self, id: ApertureId) -> Option<ApertureRef> {
        self.apertures.get(&id).cloned()
    }
}

/// Split an `AD` parameter list on `X`, parsing each field as a decimal.
fn split_params(params: &str) -> Result<Vec<f64>, ErrorKind> {
    if params.is_empty() {
        return Ok(Vec::new());
    }
    params
        .split('X')
        .map(|field| {
            field
                .parse::<f64>()
                .map_err(|_| ErrorKind::BadOperation(format!("invalid aperture parameter '{field}'")))
        })
        .collect()
}

/// Build a built-in (`Circle`/`Rectangle`/`Obround`/`Polygon`) aperture from
/// its template letter and raw parameter string, per §4.4.
pub(crate) fn parse_builtin(code: &str, params: &str) -> Result<Option<Aperture>, ErrorKind> {
    let values = split_params(params)?;
    match code {
        "C" => {
            if values.is_empty() || values.len() > 2 {
                return Err(ErrorKind::BadOperation(
                    "circle aperture expects diameter[,hole]".into(),
                ));
            }
            Ok(Some(Aperture::Circle {
                diameter: values[0],
                hole: values.get(1).copied(),
            }))
        }
        "R" => {
            if values.len() < 2 || values.len() > 3 {
                return Err(ErrorKind::BadOperation(
                    "rectangle aperture expects x_size,y_size[,hole]".into(),
                ));
            }
            Ok(Some(Aperture::Rectangle {
                x_size: values[0],
                y_size: values[1],
                hole: values.get(2).copied(),
            }))
        }
        "O" => {
            if values.len() < 2 || values.len() > 3 {
                return Err(ErrorKind::BadOperation(
                    "obround aperture expects x_size,y_size[,hole]".into(),
                ));
            }
            Ok(Some(Aperture::Obround {
                x_size: values[0],
                y_size: values[1],
                hole: values.get(2).copied(),
            }))
        }
        "P" => {
            if values.len() < 2 || values.len() > 4 {
                return Err(ErrorKind::BadOperation(
                    "polygon aperture expects outer_diameter,vertices[,rotation[,hole]]".into(),
                ));
            }
            let vertices = values[1];
            if !(3.0..=12.0).contains(&vertices) || vertices.fract() != 0.0 {
                return Err(ErrorKind::BadOperation(format!(
                    "polygon vertex count {vertices} out of range [3..12]"
                )));
            }
            Ok(Some(Aperture::Polygon {
                outer_diameter: values[0],
                vertices: vertices as u8,
                rotation: values.get(2).copied().unwrap_or(0.0),
                hole: values.get(3).copied(),
            }))
        }
        _ => Ok(None),
    }
}

/// Instantiate a macro aperture: look the template up by name, parse its
/// parameter list, and run the macro compiler.
pub(crate) fn instantiate_macro(
    registry: &TemplateRegistry,
    name: &str,
    params: &str,
) -> Result<Aperture, ErrorKind> {
    let template = registry
        .get(name)
        .ok_or_else(|| ErrorKind::UnknownTemplate(name.to_string()))?;
    let values = split_params(params)?;
    let primitives = macros::instantiate(&template.body, &values)?;
    Ok(Aperture::Macro {
        template_name: name.to_string(),
        primitives,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_circle_with_hole() {
        assert_eq!(
            parse_builtin("C", "0.1").unwrap(),
            Some(Aperture::Circle {
                diameter: 0.1,
                hole: None
            })
        );
        assert_eq!(
            parse_builtin("C", "1.5X0.3").unwrap(),
            Some(Aperture::Circle {
                diameter: 1.5,
                hole: Some(0.3)
            })
        );
    }

    #[test]
    fn parses_polygon() {
        match parse_builtin("P", "1.00X3").unwrap() {
            Some(Aperture::Polygon { vertices, .. }) => assert_eq!(vertices, 3),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn rejects_polygon_vertex_count_out_of_range() {
        assert!(parse_builtin("P", "1.00X2").is_err());
        assert!(parse_builtin("P", "1.00X13").is_err());
    }

    #[test]
    fn unknown_template_code_returns_none() {
        assert_eq!(parse_builtin("Z", "1").unwrap(), None);
    }

    #[test]
    fn duplicate_aperture_is_rejected() {
        let mut table = ApertureTable::new();
        table
            .define(ApertureId(10), Aperture::Circle { diameter: 0.1, hole: None })
            .unwrap();
        assert!(table
            .define(ApertureId(10), Aperture::Circle { diameter: 0.2, hole: None })
            .is_err());
    }
}
