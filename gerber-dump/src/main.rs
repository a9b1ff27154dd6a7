use std::fs::read_to_string;

use clap::{Parser, ValueEnum};
use gerber::object::GraphicalObject;
use gerber::GerberLayer;
use log::info;
use serde_json::{json, Value};

#[derive(Parser)]
struct Cli {
    /// Name of the file to dump
    filename: String,

    /// Output format
    #[arg(long, value_enum, default_value_t = Format::Debug)]
    format: Format,
}

#[derive(Clone, Copy, ValueEnum)]
enum Format {
    Debug,
    Json,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let cli = Cli::parse();
    let src = read_to_string(&cli.filename)?;
    info!("parsing {}", cli.filename);
    let layer = GerberLayer::parse(&src)?;
    info!("parsed {} top-level objects", layer.objects.len());

    match cli.format {
        Format::Debug => println!("{:#?}", layer),
        Format::Json => println!("{}", serde_json::to_string_pretty(&layer_to_json(&layer))?),
    }

    Ok(())
}

/// Build a JSON view of a parsed layer by hand, rather than deriving
/// `Serialize` on the core crate's types: `gerber` stays free of a
/// serialization dependency, and the binary is free to shape its own
/// output format independently of the internal object model.
fn layer_to_json(layer: &GerberLayer) -> Value {
    json!({
        "unit": layer.unit.map(|u| format!("{u:?}")),
        "format": layer.format.map(|f| json!({
            "int_digits": f.int_digits,
            "dec_digits": f.dec_digits,
        })),
        "objects": layer.objects.iter().map(object_to_json).collect::<Vec<_>>(),
    })
}

fn object_to_json(object: &GraphicalObject) -> Value {
    match object {
        GraphicalObject::Draw { origin, endpoint, .. } => json!({
            "kind": "draw",
            "origin": [origin.x, origin.y],
            "endpoint": [endpoint.x, endpoint.y],
        }),
        GraphicalObject::Arc {
            origin,
            endpoint,
            offset,
            is_cw,
            ..
        } => json!({
            "kind": "arc",
            "origin": [origin.x, origin.y],
            "endpoint": [endpoint.x, endpoint.y],
            "offset": [offset.0, offset.1],
            "clockwise": is_cw,
        }),
        GraphicalObject::Flash { origin, .. } => json!({
            "kind": "flash",
            "origin": [origin.x, origin.y],
        }),
        GraphicalObject::Region { segments, contours, .. } => json!({
            "kind": "region",
            "segment_count": segments.len(),
            "contour_count": contours.len(),
        }),
        GraphicalObject::StepAndRepeat {
            nx,
            ny,
            step_x,
            step_y,
            objects,
        } => json!({
            "kind": "step_and_repeat",
            "nx": nx,
            "ny": ny,
            "step_x": step_x,
            "step_y": step_y,
            "objects": objects.iter().map(object_to_json).collect::<Vec<_>>(),
        }),
    }
}
