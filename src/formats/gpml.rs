//! GPlates markup (GPML) plate polygons.
//!
//! Each plate is a feature under `gml:featureMember`:
//!
//! ```text
//! <gpml:UnclassifiedFeature>          (or ContinentalFragment, DisplacementPoint)
//!   <gml:name>Africa</gml:name>
//!   <gpml:reconstructionPlateId>
//!     <gpml:ConstantValue>
//!       <gpml:value>701</gpml:value>
//!       <gpml:valueType>gpml:plateId</gpml:valueType>
//!   ...
//!   <gml:posList>lat1 lon1 lat2 lon2 ...</gml:posList>
//! ```
//!
//! Note the latitude-first order in `posList`.

use quick_xml::events::Event;
use quick_xml::Reader;
use tracing::warn;

use crate::coordinate::Coordinate;
use crate::error::{PaleoError, Result};
use crate::plates::Plate;

use super::{line_at, ElementStack};

const FEATURE_ELEMENTS: [&str; 3] = ["UnclassifiedFeature", "ContinentalFragment", "DisplacementPoint"];
const PLATE_ID_VALUE_TYPE: &str = "gpml:plateId";

#[derive(Debug, Default)]
struct Feature {
    line: usize,
    name: Option<String>,
    plate_id: Option<String>,
    value_type: Option<String>,
    pos_list: Option<String>,
}

impl Feature {
    fn into_plate(self, source: &str) -> Result<Option<Plate>> {
        let Some(id_text) = self.plate_id else {
            return Ok(None);
        };
        if self.value_type.as_deref() != Some(PLATE_ID_VALUE_TYPE) {
            return Ok(None);
        }
        let Ok(plate_id) = id_text.trim().parse::<u32>() else {
            warn!("Ignoring plate with unparseable id '{}' ({}:{})", id_text, source, self.line);
            return Ok(None);
        };
        let Some(name) = self.name else {
            warn!("Could not find name for plate {} in {} - ignoring plate", plate_id, source);
            return Ok(None);
        };
        let Some(pos_list) = self.pos_list else {
            warn!(
                "Could not find polygon for plate '{}' ({}) in {} - ignoring plate",
                name, plate_id, source
            );
            return Ok(None);
        };
        let polygon = parse_pos_list(&pos_list).map_err(|msg| PaleoError::parse(source, self.line, msg))?;
        Ok(Some(Plate::new(plate_id, &name, polygon)))
    }
}

/// Whitespace-separated `lat lon` pairs.
fn parse_pos_list(text: &str) -> std::result::Result<Vec<Coordinate>, String> {
    let values = text
        .split_whitespace()
        .map(|s| {
            s.parse::<f64>()
                .map_err(|_| format!("error parsing coordinate '{}'", s))
        })
        .collect::<std::result::Result<Vec<f64>, String>>()?;
    if values.len() % 2 != 0 {
        return Err(format!(
            "odd number of values ({}) in posList, expecting latitude/longitude pairs",
            values.len()
        ));
    }
    Ok(values
        .chunks_exact(2)
        .map(|pair| Coordinate::new(pair[0], pair[1]))
        .collect())
}

/// Parse every plate feature in a GPML document.
pub fn parse_plates(xml: &str, source: &str) -> Result<Vec<Plate>> {
    let mut reader = Reader::from_str(xml);
    reader.trim_text(true);

    let mut plates = Vec::new();
    let mut stack = ElementStack::default();
    let mut feature: Option<Feature> = None;
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) => {
                let local = e.local_name();
                stack.push(local.as_ref());
                if feature.is_none() && FEATURE_ELEMENTS.iter().any(|f| f.as_bytes() == local.as_ref()) {
                    feature = Some(Feature {
                        line: line_at(xml, reader.buffer_position()),
                        ..Default::default()
                    });
                }
            }
            Ok(Event::Text(ref e)) => {
                if let Some(f) = feature.as_mut() {
                    let text = e.unescape()?;
                    if stack.ends_with(&["name"]) && f.name.is_none() {
                        f.name = Some(text.into_owned());
                    } else if stack.ends_with(&["reconstructionPlateId", "ConstantValue", "value"]) {
                        f.plate_id = Some(text.into_owned());
                    } else if stack.ends_with(&["reconstructionPlateId", "ConstantValue", "valueType"]) {
                        f.value_type = Some(text.trim().to_string());
                    } else if stack.ends_with(&["posList"]) {
                        let pos_list = f.pos_list.get_or_insert_with(String::new);
                        if !pos_list.is_empty() {
                            pos_list.push(' ');
                        }
                        pos_list.push_str(&text);
                    }
                }
            }
            Ok(Event::End(ref e)) => {
                stack.pop();
                let local = e.local_name();
                if FEATURE_ELEMENTS.iter().any(|f| f.as_bytes() == local.as_ref())
                    && !FEATURE_ELEMENTS.iter().any(|f| stack.contains(f))
                {
                    if let Some(f) = feature.take() {
                        if let Some(plate) = f.into_plate(source)? {
                            plates.push(plate);
                        }
                    }
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(PaleoError::parse(
                    source,
                    line_at(xml, reader.buffer_position()),
                    e.to_string(),
                ))
            }
            _ => {}
        }
        buf.clear();
    }

    Ok(plates)
}
