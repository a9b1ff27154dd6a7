//! Aperture macro compilation: expanding a stored template body, with a
//! concrete parameter list, into a list of primitives.
//!
//! The compiler is pure: `instantiate(body, params)` depends on nothing but
//! its arguments. Macro *templates* (the raw body text) live in the
//! [`crate::aperture::TemplateRegistry`]; only instantiation touches this
//! module.

use std::collections::HashMap;

use crate::error::ErrorKind;
use crate::expr;

/// A stored, not-yet-instantiated macro template. Parsed for real only
/// when an `AD` statement instantiates it with concrete parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct MacroTemplate {
    pub body: String,
}

/// One concrete primitive produced by instantiating a macro template.
#[derive(Debug, Clone, PartialEq)]
pub enum MacroPrimitive {
    Circle {
        exposure: bool,
        diameter: f64,
        x: f64,
        y: f64,
        rotation: f64,
    },
    VectorLine {
        exposure: bool,
        width: f64,
        x1: f64,
        y1: f64,
        x2: f64,
        y2: f64,
        rotation: f64,
    },
    CenterLine {
        exposure: bool,
        width: f64,
        height: f64,
        x: f64,
        y: f64,
        rotation: f64,
    },
    Outline {
        exposure: bool,
        points: Vec<(f64, f64)>,
        rotation: f64,
    },
    RegularPolygon {
        exposure: bool,
        vertices: u32,
        x: f64,
        y: f64,
        diameter: f64,
        rotation: f64,
    },
    Moire {
        x: f64,
        y: f64,
        outer_diameter: f64,
        ring_thickness: f64,
        gap: f64,
        num_rings: u32,
        crosshair_thickness: f64,
        crosshair_length: f64,
        rotation: f64,
    },
    Thermal {
        x: f64,
        y: f64,
        outer_diameter: f64,
        inner_diameter: f64,
        gap: f64,
        rotation: f64,
    },
}

fn macro_error(detail: impl Into<String>) -> ErrorKind {
    ErrorKind::Macro(detail.into())
}

/// Replace every `$k` occurrence in `text` with the current string value of
/// `vars[k]`. An occurrence whose variable is not yet defined is left
/// untouched, so the caller can detect it afterwards.
fn substitute(text: &str, vars: &HashMap<u32, f64>) -> String {
    let mut out = String::with_capacity(text.len());
    let bytes = text.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'$' {
            let start = i + 1;
            let mut end = start;
            while end < bytes.len() && bytes[end].is_ascii_digit() {
                end += 1;
            }
            if end > start {
                let n: u32 = text[start..end].parse().expect("digits only");
                match vars.get(&n) {
                    Some(v) => {
                        out.push_str(&format_var(*v));
                        i = end;
                        continue;
                    }
                    None => {
                        out.push('$');
                        i += 1;
                        continue;
                    }
                }
            }
        }
        out.push(bytes[i] as char);
        i += 1;
    }
    out
}

fn format_var(v: f64) -> String {
    // A plain Display keeps the substituted text a legal expression operand
    // (no exponent notation, which is outside the expression sub-language's
    // legal character set).
    format!("{v}")
}

fn eval_expr(text: &str, vars: &HashMap<u32, f64>) -> Result<f64, ErrorKind> {
    let substituted = substitute(text, vars);
    if substituted.contains('$') {
        return Err(macro_error("unfulfilled macro parameter"));
    }
    expr::eval(&substituted)
}

/// Split the numeric-argument fields of a primitive block after the code,
/// evaluating each as an expression against the current variable table.
fn eval_fields(fields: &[&str], vars: &HashMap<u32, f64>) -> Result<Vec<f64>, ErrorKind> {
    fields.iter().map(|f| eval_expr(f, vars)).collect()
}

fn exposure_from(v: f64) -> bool {
    v != 0.0
}

fn build_primitive(code: &str, fields: &[&str], vars: &HashMap<u32, f64>) -> Result<MacroPrimitive, ErrorKind> {
    let values = eval_fields(fields, vars)?;

    match code {
        "1" => {
            if values.len() < 4 || values.len() > 5 {
                return Err(macro_error(format!(
                    "circle primitive expects 4 or 5 parameters, got {}",
                    values.len()
                )));
            }
            Ok(MacroPrimitive::Circle {
                exposure: exposure_from(values[0]),
                diameter: values[1],
                x: values[2],
                y: values[3],
                rotation: values.get(4).copied().unwrap_or(0.0),
            })
        }
        "20" => {
            if values.len() < 6 || values.len() > 7 {
                return Err(macro_error(format!(
                    "vector line primitive expects 6 or 7 parameters, got {}",
                    values.len()
                )));
            }
            Ok(MacroPrimitive::VectorLine {
                exposure: exposure_from(values[0]),
                width: values[1],
                x1: values[2],
                y1: values[3],
                x2: values[4],
                y2: values[5],
                rotation: values.get(6).copied().unwrap_or(0.0),
            })
        }
        "21" => {
            if values.len() < 5 || values.len() > 6 {
                return Err(macro_error(format!(
                    "center line primitive expects 5 or 6 parameters, got {}",
                    values.len()
                )));
            }
            Ok(MacroPrimitive::CenterLine {
                exposure: exposure_from(values[0]),
                width: values[1],
                height: values[2],
                x: values[3],
                y: values[4],
                rotation: values.get(5).copied().unwrap_or(0.0),
            })
        }
        "4" => {
            // exposure, n (vertices *beyond* the start point), x, y, then
            // 2n more coordinates and a trailing rotation: 2n+1 numbers
            // follow the start point.
            if values.len() < 4 {
                return Err(macro_error("outline primitive missing parameters"));
            }
            let exposure = exposure_from(values[0]);
            let n_extra = values[1];
            if n_extra < 0.0 || n_extra.fract() != 0.0 {
                return Err(macro_error(format!(
                    "outline primitive has invalid vertex count {n_extra}"
                )));
            }
            let n = n_extra as usize;
            let expected = 4 + 2 * n + 1;
            if values.len() != expected {
                return Err(macro_error(format!(
                    "outline primitive expects {expected} parameters for {n} additional vertices, got {}",
                    values.len()
                )));
            }
            let mut points = Vec::with_capacity(n + 1);
            points.push((values[2], values[3]));
            for k in 0..n {
                let x = values[4 + 2 * k];
                let y = values[5 + 2 * k];
                points.push((x, y));
            }
            if points.len() < 3 {
                return Err(macro_error("outline primitive needs at least 3 vertices"));
            }
            let rotation = values[expected - 1];
            Ok(MacroPrimitive::Outline {
                exposure,
                points,
                rotation,
            })
        }
        "5" => {
            if values.len() < 5 || values.len() > 6 {
                return Err(macro_error(format!(
                    "regular polygon primitive expects 5 or 6 parameters, got {}",
                    values.len()
                )));
            }
            let vertices = values[1];
            if !(3.0..=12.0).contains(&vertices) || vertices.fract() != 0.0 {
                return Err(macro_error(format!(
                    "regular polygon vertex count {vertices} out of range [3..12]"
                )));
            }
            Ok(MacroPrimitive::RegularPolygon {
                exposure: exposure_from(values[0]),
                vertices: vertices as u32,
                x: values[2],
                y: values[3],
                diameter: values[4],
                rotation: values.get(5).copied().unwrap_or(0.0),
            })
        }
        "6" => {
            if values.len() < 8 || values.len() > 9 {
                return Err(macro_error(format!(
                    "moire primitive expects 8 or 9 parameters, got {}",
                    values.len()
                )));
            }
            Ok(MacroPrimitive::Moire {
                x: values[0],
                y: values[1],
                outer_diameter: values[2],
                ring_thickness: values[3],
                gap: values[4],
                num_rings: values[5] as u32,
                crosshair_thickness: values[6],
                crosshair_length: values[7],
                rotation: values.get(8).copied().unwrap_or(0.0),
            })
        }
        "7" => {
            if values.len() < 5 || values.len() > 6 {
                return Err(macro_error(format!(
                    "thermal primitive expects 5 or 6 parameters, got {}",
                    values.len()
                )));
            }
            Ok(MacroPrimitive::Thermal {
                x: values[0],
                y: values[1],
                outer_diameter: values[2],
                inner_diameter: values[3],
                gap: values[4],
                rotation: values.get(5).copied().unwrap_or(0.0),
            })
        }
        other => Err(macro_error(format!("unknown macro primitive code '{other}'"))),
    }
}

/// Instantiate a macro template with a concrete parameter list, per the
/// algorithm in §4.5: seed the variable table from positional parameters,
/// then process each `*`-delimited block of the body in order.
pub(crate) fn instantiate(body: &str, params: &[f64]) -> Result<Vec<MacroPrimitive>, ErrorKind> {
    let mut vars: HashMap<u32, f64> = HashMap::new();
    for (i, &p) in params.iter().enumerate() {
        vars.insert(i as u32 + 1, p);
    }

    let mut primitives = Vec::new();

    for raw_block in body.split('*') {
        let block: String = raw_block.chars().filter(|c| *c != '\n' && *c != '\r').collect();
        let block = block.trim();
        if block.is_empty() {
            continue;
        }
        if block.starts_with('%') || block.starts_with('0') {
            continue;
        }
        if let Some(assignment) = block.strip_prefix('$') {
            let (var_str, expr_str) = assignment
                .split_once('=')
                .ok_or_else(|| macro_error(format!("malformed variable assignment '{block}'")))?;
            let var_num: u32 = var_str
                .trim()
                .parse()
                .map_err(|_| macro_error(format!("malformed variable number in '{block}'")))?;
            let value = eval_expr(expr_str.trim(), &vars)?;
            vars.insert(var_num, value);
            continue;
        }

        let mut fields = block.split(',');
        let code = fields
            .next()
            .ok_or_else(|| macro_error("empty primitive block"))?
            .trim();
        let rest: Vec<&str> = fields.map(str::trim).collect();
        primitives.push(build_primitive(code, &rest, &vars)?);
    }

    Ok(primitives)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn instantiates_donut_variable_macro() {
        // %AMDONUTVAR*1,1,$1,$2,$3*1,0,$4,$2,$3*%
        // %ADD34DONUTVAR,0.100X0X0X0.080*%
        let body = "1,1,$1,$2,$3*1,0,$4,$2,$3*";
        let primitives = instantiate(body, &[0.100, 0.0, 0.0, 0.080]).unwrap();
        assert_eq!(
            primitives,
            vec![
                MacroPrimitive::Circle {
                    exposure: true,
                    diameter: 0.1,
                    x: 0.0,
                    y: 0.0,
                    rotation: 0.0,
                },
                MacroPrimitive::Circle {
                    exposure: false,
                    diameter: 0.08,
                    x: 0.0,
                    y: 0.0,
                    rotation: 0.0,
                },
            ]
        );
    }

    #[test]
    fn variable_assignment_block_computes_derived_value() {
        let body = "1,1,$1,$2,$3*$4=$1x0.75*1,0,$4,$2,$3*";
        let primitives = instantiate(body, &[0.4, 0.0, 0.0]).unwrap();
        assert_eq!(
            primitives[1],
            MacroPrimitive::Circle {
                exposure: false,
                diameter: 0.3,
                x: 0.0,
                y: 0.0,
                rotation: 0.0,
            }
        );
    }

    #[test]
    fn reuse_with_different_parameters_gives_distinct_results() {
        let body = "1,1,$1,$2,$3*";
        let a = instantiate(body, &[0.3, 0.0, 0.0]).unwrap();
        let b = instantiate(body, &[0.6, 1.0, 1.0]).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn rejects_unknown_primitive_code() {
        assert!(instantiate("99,1,0,0,0*", &[]).is_err());
    }

    #[test]
    fn rejects_unfulfilled_parameter() {
        assert!(instantiate("1,1,$1,$2,$3*", &[]).is_err());
    }

    #[test]
    fn rejects_outline_with_wrong_count() {
        assert!(instantiate("4,1,4,0,0,1,1,2,2*", &[]).is_err());
    }
}
