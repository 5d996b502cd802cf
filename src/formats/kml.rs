//! KML plate polygons.
//!
//! One `Placemark` per plate, carrying the plate id in extended data
//! (`<SimpleData name="PLATEID1">`). A placemark may hold several polygons
//! inside a `MultiGeometry`; each becomes a separate plate part. Only outer
//! boundaries are read. Coordinates are `lon,lat[,alt]` tuples.

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use tracing::warn;

use crate::coordinate::Coordinate;
use crate::error::{PaleoError, Result};
use crate::plates::Plate;

use super::{line_at, ElementStack};

const PLATE_ID_FIELD: &[u8] = b"PLATEID1";

#[derive(Debug, Default)]
struct Placemark {
    line: usize,
    name: String,
    plate_id: Option<String>,
    in_plate_id_field: bool,
    /// Text of the outer ring being read, collected until `</coordinates>`.
    ring: Option<String>,
    polygons: Vec<String>,
}

/// Whitespace-separated `lon,lat[,alt]` tuples.
fn parse_coordinates(text: &str) -> std::result::Result<Vec<Coordinate>, String> {
    text.split_whitespace()
        .map(|tuple| {
            let mut parts = tuple.split(',').map(|v| v.trim().parse::<f64>());
            match (parts.next(), parts.next()) {
                (Some(Ok(lon)), Some(Ok(lat))) => Ok(Coordinate::new(lat, lon)),
                _ => Err(format!("error parsing coordinate tuple '{}'", tuple)),
            }
        })
        .collect()
}

fn is_plate_id_field(e: &BytesStart) -> Result<bool> {
    for attr in e.attributes() {
        let attr = attr.map_err(quick_xml::Error::from)?;
        if attr.key.as_ref() == b"name" && attr.value.as_ref() == PLATE_ID_FIELD {
            return Ok(true);
        }
    }
    Ok(false)
}

impl Placemark {
    fn into_plates(self, source: &str) -> Result<Vec<Plate>> {
        let plate_id = match self.plate_id.as_deref().map(|s| s.trim().parse::<u32>()) {
            Some(Ok(id)) if id > 0 => id,
            Some(_) => {
                warn!("Ignoring plate '{}': unable to parse plate ID", self.name);
                return Ok(Vec::new());
            }
            None => {
                if !self.polygons.is_empty() {
                    warn!("Ignoring plate '{}': unable to determine plate ID", self.name);
                }
                return Ok(Vec::new());
            }
        };
        self.polygons
            .iter()
            .map(|text| {
                parse_coordinates(text)
                    .map(|polygon| Plate::new(plate_id, &self.name, polygon))
                    .map_err(|msg| PaleoError::parse(source, self.line, msg))
            })
            .collect()
    }
}

/// Parse every plate polygon in a KML document.
pub fn parse_plates(xml: &str, source: &str) -> Result<Vec<Plate>> {
    let mut reader = Reader::from_str(xml);
    reader.trim_text(true);

    let mut plates = Vec::new();
    let mut stack = ElementStack::default();
    let mut placemark: Option<Placemark> = None;
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) => {
                stack.push(e.local_name().as_ref());
                match e.local_name().as_ref() {
                    b"Placemark" => {
                        placemark = Some(Placemark {
                            line: line_at(xml, reader.buffer_position()),
                            ..Default::default()
                        })
                    }
                    b"SimpleData" => {
                        if let Some(p) = placemark.as_mut() {
                            p.in_plate_id_field = is_plate_id_field(e)?;
                        }
                    }
                    _ => {}
                }
            }
            Ok(Event::Text(ref e)) => {
                if let Some(p) = placemark.as_mut() {
                    let text = e.unescape()?;
                    if stack.ends_with(&["Placemark", "name"]) {
                        p.name = text.into_owned();
                    } else if stack.ends_with(&["SimpleData"]) && p.in_plate_id_field {
                        p.plate_id = Some(text.into_owned());
                    } else if stack.ends_with(&["outerBoundaryIs", "LinearRing", "coordinates"])
                        && stack.contains("Polygon")
                    {
                        let ring = p.ring.get_or_insert_with(String::new);
                        if !ring.is_empty() {
                            ring.push(' ');
                        }
                        ring.push_str(&text);
                    }
                }
            }
            Ok(Event::End(ref e)) => {
                stack.pop();
                match e.local_name().as_ref() {
                    b"Placemark" => {
                        if let Some(p) = placemark.take() {
                            plates.extend(p.into_plates(source)?);
                        }
                    }
                    b"SimpleData" => {
                        if let Some(p) = placemark.as_mut() {
                            p.in_plate_id_field = false;
                        }
                    }
                    b"coordinates" => {
                        if let Some(p) = placemark.as_mut() {
                            if let Some(ring) = p.ring.take() {
                                p.polygons.push(ring);
                            }
                        }
                    }
                    _ => {}
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

#[cfg(test)]
mod tests {
    use super::*;

    const KML: &str = r##"<?xml version="1.0" encoding="UTF-8"?>
<kml xmlns="http://www.opengis.net/kml/2.2">
<Document>
 <name>plates</name>
 <Placemark>
  <name>Africa</name>
  <ExtendedData><SchemaData schemaUrl="#plates">
   <SimpleData name="NAME">Africa</SimpleData>
   <SimpleData name="PLATEID1">701</SimpleData>
  </SchemaData></ExtendedData>
  <Polygon><outerBoundaryIs><LinearRing><coordinates>
   10,-45,0 40,-45,0 40,5,0 10,5,0
  </coordinates></LinearRing></outerBoundaryIs></Polygon>
 </Placemark>
 <Placemark>
  <name>Pacific</name>
  <ExtendedData><SchemaData>
   <SimpleData name="PLATEID1">901</SimpleData>
  </SchemaData></ExtendedData>
  <MultiGeometry>
   <Polygon><outerBoundaryIs><LinearRing><coordinates>-170,-10 -150,-10 -150,10 -170,10</coordinates></LinearRing></outerBoundaryIs>
    <innerBoundaryIs><LinearRing><coordinates>-165,-5 -155,-5 -155,5</coordinates></LinearRing></innerBoundaryIs></Polygon>
   <Polygon><outerBoundaryIs><LinearRing><coordinates>170,-10 179,-10 179,10 170,10</coordinates></LinearRing></outerBoundaryIs></Polygon>
  </MultiGeometry>
 </Placemark>
 <Placemark>
  <name>No id</name>
  <Polygon><outerBoundaryIs><LinearRing><coordinates>0,0 1,0 1,1</coordinates></LinearRing></outerBoundaryIs></Polygon>
 </Placemark>
</Document>
</kml>
"##;

    #[test]
    fn test_parse_placemarks() {
        let plates = parse_plates(KML, "plates.kml").unwrap();
        assert_eq!(plates.len(), 3);

        assert_eq!(plates[0].id, 701);
        assert_eq!(plates[0].name, "Africa");
        assert_eq!(plates[0].polygon.len(), 4);
        assert_eq!(plates[0].polygon[0], Coordinate::new(-45.0, 10.0));

        assert_eq!(plates[1].id, 901);
        assert_eq!(plates[2].id, 901);
        assert_eq!(plates[1].polygon.len(), 4);
        assert_eq!(plates[2].polygon[1], Coordinate::new(-10.0, 179.0));
    }

    #[test]
    fn test_ring_split_by_comment() {
        let xml = KML.replace(
            "10,-45,0 40,-45,0 40,5,0 10,5,0",
            "10,-45,0 40,-45,0 <!-- edited --> 40,5,0 10,5,0",
        );
        let plates = parse_plates(&xml, "plates.kml").unwrap();
        assert_eq!(plates.len(), 3);
        assert_eq!(plates[0].id, 701);
        assert_eq!(plates[0].polygon.len(), 4);
        assert_eq!(plates[0].polygon[2], Coordinate::new(5.0, 40.0));
    }

    #[test]
    fn test_coordinates() {
        assert_eq!(
            parse_coordinates("1,2 3,4,100\n").unwrap(),
            vec![Coordinate::new(2.0, 1.0), Coordinate::new(4.0, 3.0)]
        );
        assert!(parse_coordinates("1;2").is_err());
    }
}
