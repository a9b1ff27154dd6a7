//! The parser proper: statement classification and dispatch, per §4.1, and
//! the individual statement handlers of §4.2–§4.7.

use std::rc::Rc;

use log::trace;

use crate::aperture::{self, Aperture, ApertureTable, TemplateRegistry};
use crate::attribute;
use crate::builder::ObjectBuilder;
use crate::error::{Error, ErrorKind, Result};
use crate::lexer::{self, StatementText};
use crate::object::{GraphicalObject, Segment};
use crate::state::{
    ApertureId, CoordinateFormat, InterpolationMode, Mirroring, ModalState, Point, Polarity, Unit,
};
use crate::tokens;

use nom::{
    character::complete::{anychar, char},
    combinator::opt,
    sequence::{pair, preceded},
};

/// A parsed Gerber layer: the fully resolved, ordered object stream, the
/// apertures (including block apertures) defined along the way, and
/// whatever format/unit was in effect at end of file.
#[derive(Debug, Clone)]
pub struct GerberLayer {
    pub objects: Vec<GraphicalObject>,
    pub apertures: ApertureTable,
    pub format: Option<CoordinateFormat>,
    pub unit: Option<Unit>,
}

impl GerberLayer {
    /// Parse a complete Gerber source file into an ordered object stream.
    pub fn parse(input: &str) -> Result<GerberLayer> {
        let mut parser = Parser::new();
        parser.run(input)?;
        Ok(GerberLayer {
            objects: parser.builder.into_top_level(),
            apertures: parser.apertures,
            format: parser.state.format,
            unit: parser.state.unit,
        })
    }
}

struct Parser {
    state: ModalState,
    templates: TemplateRegistry,
    apertures: ApertureTable,
    builder: ObjectBuilder,
    saw_eof: bool,
}

impl Parser {
    fn new() -> Self {
        Parser {
            state: ModalState::default(),
            templates: TemplateRegistry::new(),
            apertures: ApertureTable::new(),
            builder: ObjectBuilder::new(),
            saw_eof: false,
        }
    }

    fn run(&mut self, input: &str) -> Result<()> {
        for statement in lexer::lex(input) {
            let line = statement.line;
            self.dispatch(&statement.text, line)
                .map_err(|kind| Error::new(line, kind))?;
        }

        if !self.saw_eof {
            return Err(Error::new(0, ErrorKind::EofMissing));
        }
        if !self.builder.at_top_level() {
            return Err(Error::new(0, ErrorKind::Lexical(
                "input ended with an unclosed region, block, or step-and-repeat".into(),
            )));
        }
        Ok(())
    }

    fn dispatch(&mut self, text: &StatementText<'_>, line: usize) -> std::result::Result<(), ErrorKind> {
        match text {
            StatementText::Extended(payload) => self.dispatch_extended(payload, line),
            StatementText::Word(payload) => self.dispatch_word(payload, line),
        }
    }

    fn dispatch_extended(&mut self, payload: &str, line: usize) -> std::result::Result<(), ErrorKind> {
        trace!("line {line}: extended statement '{payload}'");

        if let Some(rest) = payload.strip_prefix("MO") {
            return self.handle_mode(rest);
        }
        if let Some(rest) = payload.strip_prefix("FS") {
            return self.handle_format(rest);
        }
        if let Some(rest) = payload.strip_prefix("AM") {
            return self.handle_macro_define(rest);
        }
        if let Some(rest) = payload.strip_prefix("AD") {
            return self.handle_aperture_define(rest);
        }
        if let Some(rest) = payload.strip_prefix("AB") {
            return self.handle_aperture_block(rest);
        }
        if let Some(rest) = payload.strip_prefix("SR") {
            return self.handle_step_and_repeat(rest);
        }
        if let Some(rest) = payload.strip_prefix("LP") {
            return self.handle_load_polarity(rest);
        }
        if let Some(rest) = payload.strip_prefix("LM") {
            return self.handle_load_mirroring(rest);
        }
        if let Some(rest) = payload.strip_prefix("LR") {
            return self.handle_load_rotation(rest);
        }
        if let Some(rest) = payload.strip_prefix("LS") {
            return self.handle_load_scaling(rest);
        }
        if attribute::is_attribute(payload) {
            return Ok(());
        }

        Err(ErrorKind::Lexical(format!("unrecognized extended statement '{payload}'")))
    }

    fn dispatch_word(&mut self, payload: &str, line: usize) -> std::result::Result<(), ErrorKind> {
        trace!("line {line}: word statement '{payload}'");

        if payload.starts_with("G04") {
            return Ok(()); // comment, no-op
        }
        match payload {
            "G01*" => {
                self.state.interpolation = InterpolationMode::Linear;
                return Ok(());
            }
            "G02*" => {
                self.state.interpolation = InterpolationMode::CwCircular;
                return Ok(());
            }
            "G03*" => {
                self.state.interpolation = InterpolationMode::CcwCircular;
                return Ok(());
            }
            "G36*" => {
                self.builder.push_region(self.state.transform);
                return Ok(());
            }
            "G37*" => {
                let region = self.builder.pop_region()?;
                self.builder.append_object(region)?;
                return Ok(());
            }
            "G74*" => {
                return Err(ErrorKind::NotImplemented(
                    "single-quadrant circular interpolation (G74) is not supported".into(),
                ));
            }
            "G75*" => {
                return Ok(()); // multi-quadrant mode, accepted with no state change
            }
            "M02*" => {
                self.saw_eof = true;
                return Ok(());
            }
            _ => {}
        }

        let body = payload
            .strip_suffix('*')
            .ok_or_else(|| ErrorKind::Lexical(format!("statement missing '*' terminator: '{payload}'")))?;

        if let Some(prefix) = body.strip_suffix("D01") {
            return self.handle_operation(prefix, Operation::Interpolate);
        }
        if let Some(prefix) = body.strip_suffix("D02") {
            return self.handle_operation(prefix, Operation::Move);
        }
        if let Some(prefix) = body.strip_suffix("D03") {
            return self.handle_operation(prefix, Operation::Flash);
        }

        if let Some(rest) = body.strip_prefix('D') {
            if let Ok(id) = rest.parse::<i64>() {
                if id >= 10 {
                    return self.handle_select_aperture(ApertureId(id));
                }
            }
        }

        Err(ErrorKind::Lexical(format!("unrecognized statement '{payload}'")))
    }

    // ---- §4.2 Format and unit handling ----

    fn handle_mode(&mut self, rest: &str) -> std::result::Result<(), ErrorKind> {
        let rest = expect_terminated(rest, "MO")?;
        let unit = match rest {
            "MM" => Unit::Mm,
            "IN" => Unit::In,
            other => return Err(ErrorKind::Format(format!("unrecognized unit '{other}'"))),
        };
        self.state.unit = Some(unit);
        Ok(())
    }

    fn handle_format(&mut self, rest: &str) -> std::result::Result<(), ErrorKind> {
        if self.state.format.is_some() {
            return Err(ErrorKind::Format("format must be set exactly once".into()));
        }
        let rest = expect_terminated(rest, "FS")?;
        let rest = rest
            .strip_prefix("LA")
            .ok_or_else(|| ErrorKind::Format("only the 'LA' absolute-coordinates mode is supported".into()))?;
        let rest = rest
            .strip_prefix('X')
            .ok_or_else(|| ErrorKind::Format(format!("malformed format statement 'FS{rest}'")))?;

        let (x_int, x_dec, rest) = digit_pair(rest)?;
        let rest = rest
            .strip_prefix('Y')
            .ok_or_else(|| ErrorKind::Format(format!("malformed format statement, expected 'Y': '{rest}'")))?;
        let (y_int, y_dec, rest) = digit_pair(rest)?;
        if !rest.is_empty() {
            return Err(ErrorKind::Format(format!("trailing characters in format statement: '{rest}'")));
        }

        if x_int != y_int || x_dec != y_dec {
            return Err(ErrorKind::Format("X and Y coordinate format digits must match".into()));
        }

        self.state.format = Some(CoordinateFormat {
            int_digits: x_int,
            dec_digits: x_dec,
        });
        Ok(())
    }

    // ---- §4.3 Operation and transform handlers ----

    fn handle_load_polarity(&mut self, rest: &str) -> std::result::Result<(), ErrorKind> {
        let rest = expect_terminated(rest, "LP")?;
        self.state.transform.polarity = match rest {
            "C" => Polarity::Clear,
            "D" => Polarity::Dark,
            other => return Err(ErrorKind::Format(format!("unrecognized polarity '{other}'"))),
        };
        Ok(())
    }

    fn handle_load_mirroring(&mut self, rest: &str) -> std::result::Result<(), ErrorKind> {
        let rest = expect_terminated(rest, "LM")?;
        self.state.transform.mirroring = match rest {
            "N" => Mirroring::N,
            "X" => Mirroring::X,
            "Y" => Mirroring::Y,
            "XY" => Mirroring::Xy,
            other => return Err(ErrorKind::Format(format!("unrecognized mirroring '{other}'"))),
        };
        Ok(())
    }

    fn handle_load_rotation(&mut self, rest: &str) -> std::result::Result<(), ErrorKind> {
        let rest = expect_terminated(rest, "LR")?;
        let (remainder, value) = tokens::decimal(rest).map_err(|_| ErrorKind::Format(format!("bad rotation '{rest}'")))?;
        if !remainder.is_empty() {
            return Err(ErrorKind::Format(format!("trailing characters in rotation statement: '{remainder}'")));
        }
        self.state.transform.rotation = value;
        Ok(())
    }

    fn handle_load_scaling(&mut self, rest: &str) -> std::result::Result<(), ErrorKind> {
        let rest = expect_terminated(rest, "LS")?;
        let (remainder, value) = tokens::decimal(rest).map_err(|_| ErrorKind::Format(format!("bad scaling '{rest}'")))?;
        if !remainder.is_empty() {
            return Err(ErrorKind::Format(format!("trailing characters in scaling statement: '{remainder}'")));
        }
        self.state.transform.scaling = value;
        Ok(())
    }

    fn handle_select_aperture(&mut self, id: ApertureId) -> std::result::Result<(), ErrorKind> {
        if self.apertures.get(id).is_none() {
            return Err(ErrorKind::UndefinedAperture(id.to_string()));
        }
        self.state.current_aperture = Some(id);
        Ok(())
    }

    fn handle_operation(&mut self, prefix: &str, op: Operation) -> std::result::Result<(), ErrorKind> {
        let (x, y, ij, rest) = parse_operation_fields(prefix)?;
        if !rest.is_empty() {
            return Err(ErrorKind::BadOperation(format!("trailing characters before operation code: '{rest}'")));
        }

        let new_point = match (x, y) {
            (Some(x), Some(y)) => Point { x, y },
            (Some(x), None) => Point { x, y: self.state.current_point.y },
            (None, Some(y)) => Point { x: self.state.current_point.x, y },
            (None, None) => {
                return Err(ErrorKind::BadOperation("move/flash/draw with no X or Y coordinate".into()));
            }
        };

        match op {
            Operation::Move => {
                self.state.current_point = new_point;
            }
            Operation::Interpolate => {
                let origin = self.state.current_point;
                let in_region = self.builder.in_region();
                match self.state.interpolation {
                    InterpolationMode::Linear => {
                        if in_region {
                            self.builder.append_segment(Segment::Draw {
                                origin,
                                endpoint: new_point,
                            })?;
                        } else {
                            let aperture = self.require_current_aperture()?;
                            self.builder.append_object(GraphicalObject::Draw {
                                aperture_snapshot: aperture,
                                transform_snapshot: self.state.transform,
                                origin,
                                endpoint: new_point,
                            })?;
                        }
                    }
                    InterpolationMode::CwCircular | InterpolationMode::CcwCircular => {
                        let (i, j) = ij.ok_or_else(|| {
                            ErrorKind::BadOperation("circular interpolation requires I and J".into())
                        })?;
                        let is_cw = matches!(self.state.interpolation, InterpolationMode::CwCircular);
                        if in_region {
                            self.builder.append_segment(Segment::Arc {
                                origin,
                                endpoint: new_point,
                                offset: (i, j),
                                is_cw,
                            })?;
                        } else {
                            let aperture = self.require_current_aperture()?;
                            self.builder.append_object(GraphicalObject::Arc {
                                aperture_snapshot: aperture,
                                transform_snapshot: self.state.transform,
                                origin,
                                endpoint: new_point,
                                offset: (i, j),
                                is_cw,
                            })?;
                        }
                    }
                }
                self.state.current_point = new_point;
            }
            Operation::Flash => {
                if self.builder.in_region() {
                    return Err(ErrorKind::Region("D03 is not permitted inside a region".into()));
                }
                let aperture = self.require_current_aperture()?;
                self.builder.append_object(GraphicalObject::Flash {
                    aperture_snapshot: aperture,
                    transform_snapshot: self.state.transform,
                    origin: new_point,
                })?;
                self.state.current_point = new_point;
            }
        }
        Ok(())
    }

    fn require_current_aperture(&self) -> std::result::Result<aperture::ApertureRef, ErrorKind> {
        let id = self
            .state
            .current_aperture
            .ok_or_else(|| ErrorKind::BadOperation("no current aperture selected".into()))?;
        self.apertures
            .get(id)
            .ok_or_else(|| ErrorKind::UndefinedAperture(id.to_string()))
    }

    // ---- §4.4 Aperture define ----

    fn handle_aperture_define(&mut self, rest: &str) -> std::result::Result<(), ErrorKind> {
        let rest = expect_terminated(rest, "AD")?;
        let (rest, id) = tokens::aperture_identifier(rest)
            .map_err(|_| ErrorKind::BadOperation(format!("malformed aperture identifier in 'AD{rest}'")))?;
        let (rest, name) = tokens::name(rest)
            .map_err(|_| ErrorKind::UnknownTemplate(format!("malformed template name in 'AD{rest}'")))?;
        let params = rest.strip_prefix(',').unwrap_or(rest);

        let aperture = if let Some(builtin) = aperture::parse_builtin(name, params)? {
            builtin
        } else {
            aperture::instantiate_macro(&self.templates, name, params)?
        };

        self.apertures.define(ApertureId(id), aperture)
    }

    // ---- §4.5 Macro compilation ----

    fn handle_macro_define(&mut self, rest: &str) -> std::result::Result<(), ErrorKind> {
        let rest = rest
            .strip_suffix('*')
            .ok_or_else(|| ErrorKind::Lexical(format!("malformed macro definition 'AM{rest}'")))?;
        let (body, name) = tokens::name(rest)
            .map_err(|_| ErrorKind::Lexical(format!("malformed macro name in 'AM{rest}'")))?;
        let body = body
            .strip_prefix('*')
            .ok_or_else(|| ErrorKind::Lexical(format!("macro definition missing body separator: 'AM{rest}'")))?;
        self.templates.define(name, body.to_string())
    }

    // ---- §4.6 Region construction ----
    // handled inline in dispatch_word (G36/G37) and handle_operation.

    // ---- §4.7 Aperture blocks and step-and-repeat ----

    fn handle_aperture_block(&mut self, rest: &str) -> std::result::Result<(), ErrorKind> {
        let rest = expect_terminated(rest, "AB")?;
        if rest.is_empty() {
            let (id, objects) = self.builder.pop_block()?;
            self.apertures
                .define(id, Aperture::Block { objects: Rc::new(objects) })?;
            return Ok(());
        }
        let (rest, id) = tokens::aperture_identifier(rest)
            .map_err(|_| ErrorKind::BadOperation(format!("malformed aperture block identifier 'AB{rest}'")))?;
        if !rest.is_empty() {
            return Err(ErrorKind::Lexical(format!("trailing characters in aperture block open: '{rest}'")));
        }
        self.builder.push_block(ApertureId(id));
        Ok(())
    }

    fn handle_step_and_repeat(&mut self, rest: &str) -> std::result::Result<(), ErrorKind> {
        let rest = expect_terminated(rest, "SR")?;
        if rest.is_empty() {
            let sr = self.builder.pop_step_and_repeat()?;
            self.builder.append_object(sr)?;
            return Ok(());
        }

        let rest = rest
            .strip_prefix('X')
            .ok_or_else(|| ErrorKind::Lexical(format!("malformed step-and-repeat open 'SR{rest}'")))?;
        let (rest, nx) = tokens::positive_integer(rest)
            .map_err(|_| ErrorKind::BadOperation(format!("malformed step-and-repeat nx in 'SR...{rest}'")))?;
        let rest = rest
            .strip_prefix('Y')
            .ok_or_else(|| ErrorKind::Lexical(format!("malformed step-and-repeat, expected 'Y': '{rest}'")))?;
        let (rest, ny) = tokens::positive_integer(rest)
            .map_err(|_| ErrorKind::BadOperation(format!("malformed step-and-repeat ny in 'SR...{rest}'")))?;
        let rest = rest
            .strip_prefix('I')
            .ok_or_else(|| ErrorKind::Lexical(format!("malformed step-and-repeat, expected 'I': '{rest}'")))?;
        let (rest, step_x) = tokens::decimal(rest)
            .map_err(|_| ErrorKind::BadOperation(format!("malformed step-and-repeat step_x in 'SR...{rest}'")))?;
        let rest = rest
            .strip_prefix('J')
            .ok_or_else(|| ErrorKind::Lexical(format!("malformed step-and-repeat, expected 'J': '{rest}'")))?;
        let (rest, step_y) = tokens::decimal(rest)
            .map_err(|_| ErrorKind::BadOperation(format!("malformed step-and-repeat step_y in 'SR...{rest}'")))?;
        if !rest.is_empty() {
            return Err(ErrorKind::Lexical(format!("trailing characters in step-and-repeat open: '{rest}'")));
        }
        if nx < 1 || ny < 1 {
            return Err(ErrorKind::BadOperation("step-and-repeat nx and ny must be >= 1".into()));
        }
        if step_x < 0.0 || step_y < 0.0 {
            return Err(ErrorKind::BadOperation("step-and-repeat steps must be >= 0".into()));
        }

        self.builder.push_step_and_repeat(nx as u32, ny as u32, step_x, step_y);
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Operation {
    Move,
    Interpolate,
    Flash,
}

/// Strip the command code prefix and required trailing `*`, leaving the
/// payload between them. Used for extended statements whose whole body is
/// one simple command.
fn expect_terminated<'a>(rest: &'a str, code: &str) -> std::result::Result<&'a str, ErrorKind> {
    rest.strip_suffix('*')
        .ok_or_else(|| ErrorKind::Lexical(format!("malformed '{code}' statement: missing terminator")))
}

fn digit_pair(input: &str) -> std::result::Result<(u8, u8, &str), ErrorKind> {
    let parser_result: nom::IResult<&str, (char, char)> = pair(anychar, anychar)(input);
    let (rest, (a, b)) = parser_result.map_err(|_| ErrorKind::Format(format!("malformed format digits in '{input}'")))?;
    let int_digits = a
        .to_digit(10)
        .filter(|&d| (1..=6).contains(&d))
        .ok_or_else(|| ErrorKind::Format(format!("integer digit count out of range [1..6]: '{a}'")))?;
    let dec_digits = b
        .to_digit(10)
        .filter(|&d| (3..=6).contains(&d))
        .ok_or_else(|| ErrorKind::Format(format!("decimal digit count out of range [3..6]: '{b}'")))?;
    Ok((int_digits as u8, dec_digits as u8, rest))
}

type OperationFields<'a> = (Option<i64>, Option<i64>, Option<(i64, i64)>, &'a str);

/// Parse the `X<int>Y<int>I<int>J<int>` prefix of an operation statement,
/// all fields optional, in that fixed order.
fn parse_operation_fields(input: &str) -> std::result::Result<OperationFields<'_>, ErrorKind> {
    let parse: nom::IResult<&str, _> = pair(
        opt(preceded(char('X'), tokens::integer)),
        pair(
            opt(preceded(char('Y'), tokens::integer)),
            opt(pair(preceded(char('I'), tokens::integer), preceded(char('J'), tokens::integer))),
        ),
    )(input);
    let (rest, (x, (y, ij))) = parse.map_err(|_| ErrorKind::BadOperation(format!("malformed operation fields in '{input}'")))?;
    Ok((x, y, ij, rest))
}
