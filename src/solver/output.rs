//! Result writers: CSV table, KML map, machine-readable block, and the
//! one-line human summary.

use std::io::Write;

use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;

use crate::coordinate::Coordinate;
use crate::error::Result;
use crate::geomath::is_valid_latitude;
use crate::plates::{Plate, PlateDataset};

use super::entry::PaleolatitudeEntry;

pub const CSV_HEADER: [&str; 6] = [
    "age",
    "latitude",
    "lower bound",
    "upper bound",
    "interpolated",
    "relative_to",
];

const KML_DOCUMENT_NAME: &str = "paleolatitude.org";
const SITE_STYLE: &str = "paleolatitude_site";
const SITE_ICON: &str = "http://maps.google.com/mapfiles/kml/shapes/target.png";
const RESOLVED_PLATE_COLOR: &str = "ff0000ff";
const OTHER_PLATE_COLOR: &str = "440000ff";

fn latitude_field(latitude: f64) -> String {
    if is_valid_latitude(latitude) {
        format!("{:.5}", latitude)
    } else {
        String::new()
    }
}

fn reference_plate_label(plate_id: u32, plates: &PlateDataset) -> String {
    match plates.plate_name(plate_id) {
        Some(name) => format!("{} ({})", name, plate_id),
        None => format!("Plate {}", plate_id),
    }
}

/// Write one `;`-separated row per entry, preceded by [`CSV_HEADER`].
pub fn write_csv<W: Write>(out: W, entries: &[PaleolatitudeEntry], plates: &PlateDataset) -> Result<()> {
    let mut wtr = csv::WriterBuilder::new()
        .delimiter(b';')
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(out);

    wtr.write_record(CSV_HEADER)?;
    for entry in entries {
        wtr.write_record([
            format!("{:.2}", entry.age_myr()),
            latitude_field(entry.palat),
            latitude_field(entry.palat_min),
            latitude_field(entry.palat_max),
            if entry.is_interpolated { "1" } else { "0" }.to_string(),
            reference_plate_label(entry.computed_using_plate_id, plates),
        ])?;
    }
    wtr.flush()?;
    Ok(())
}

fn text_element<W: Write>(writer: &mut Writer<W>, name: &str, text: &str) -> Result<()> {
    writer.write_event(Event::Start(BytesStart::new(name)))?;
    writer.write_event(Event::Text(BytesText::new(text)))?;
    writer.write_event(Event::End(BytesEnd::new(name)))?;
    Ok(())
}

fn start<W: Write>(writer: &mut Writer<W>, name: &str) -> Result<()> {
    writer.write_event(Event::Start(BytesStart::new(name)))?;
    Ok(())
}

fn end<W: Write>(writer: &mut Writer<W>, name: &str) -> Result<()> {
    writer.write_event(Event::End(BytesEnd::new(name)))?;
    Ok(())
}

fn write_site_styles<W: Write>(writer: &mut Writer<W>) -> Result<()> {
    let default_style = format!("{}_default", SITE_STYLE);

    let mut style = BytesStart::new("Style");
    style.push_attribute(("id", default_style.as_str()));
    writer.write_event(Event::Start(style))?;
    start(writer, "IconStyle")?;
    text_element(writer, "scale", "0.75")?;
    start(writer, "Icon")?;
    text_element(writer, "href", SITE_ICON)?;
    end(writer, "Icon")?;
    end(writer, "IconStyle")?;
    end(writer, "Style")?;

    let mut style_map = BytesStart::new("StyleMap");
    style_map.push_attribute(("id", SITE_STYLE));
    writer.write_event(Event::Start(style_map))?;
    for key in ["normal", "highlight"] {
        start(writer, "Pair")?;
        text_element(writer, "key", key)?;
        text_element(writer, "styleUrl", &format!("#{}", default_style))?;
        end(writer, "Pair")?;
    }
    end(writer, "StyleMap")
}

fn write_site<W: Write>(writer: &mut Writer<W>, site: &Coordinate) -> Result<()> {
    start(writer, "Placemark")?;
    text_element(writer, "name", "Site location")?;
    text_element(writer, "open", "1")?;
    text_element(writer, "styleUrl", &format!("#{}", SITE_STYLE))?;
    start(writer, "Point")?;
    text_element(
        writer,
        "coordinates",
        &format!("{},{}", site.longitude, site.latitude),
    )?;
    end(writer, "Point")?;
    end(writer, "Placemark")
}

fn write_plate<W: Write>(writer: &mut Writer<W>, plate: &Plate, resolved: bool) -> Result<()> {
    start(writer, "Placemark")?;
    text_element(writer, "name", &format!("{} ({})", plate.name, plate.id))?;
    start(writer, "Style")?;
    start(writer, "LineStyle")?;
    let color = if resolved { RESOLVED_PLATE_COLOR } else { OTHER_PLATE_COLOR };
    text_element(writer, "color", color)?;
    end(writer, "LineStyle")?;
    start(writer, "PolyStyle")?;
    text_element(writer, "fill", "0")?;
    end(writer, "PolyStyle")?;
    end(writer, "Style")?;

    let coordinates = plate
        .polygon
        .iter()
        .map(|c| format!("{},{}", c.longitude, c.latitude))
        .collect::<Vec<_>>()
        .join(" ");
    start(writer, "Polygon")?;
    start(writer, "outerBoundaryIs")?;
    start(writer, "LinearRing")?;
    text_element(writer, "coordinates", &coordinates)?;
    end(writer, "LinearRing")?;
    end(writer, "outerBoundaryIs")?;
    end(writer, "Polygon")?;
    end(writer, "Placemark")
}

/// Write a KML document with the site and every plate polygon; parts of the
/// resolved plate are drawn opaque, all others translucent.
pub fn write_kml<W: Write>(
    out: W,
    site: &Coordinate,
    resolved_plate_id: u32,
    plates: &PlateDataset,
) -> Result<()> {
    let mut writer = Writer::new_with_indent(out, b' ', 2);
    writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;

    let mut kml = BytesStart::new("kml");
    kml.push_attribute(("xmlns", "http://www.opengis.net/kml/2.2"));
    writer.write_event(Event::Start(kml))?;
    start(&mut writer, "Document")?;
    text_element(&mut writer, "name", KML_DOCUMENT_NAME)?;

    write_site_styles(&mut writer)?;
    write_site(&mut writer, site)?;
    for plate in plates.plates() {
        write_plate(&mut writer, plate, plate.id == resolved_plate_id)?;
    }

    end(&mut writer, "Document")?;
    end(&mut writer, "kml")?;
    writeln!(writer.get_mut())?;
    Ok(())
}

/// Header lines, then the CSV table and the KML document, for consumption
/// by other programs.
pub fn write_machine_readable<W: Write>(
    mut out: W,
    site: &Coordinate,
    resolved: &Plate,
    entries: &[PaleolatitudeEntry],
    plates: &PlateDataset,
) -> Result<()> {
    writeln!(out, "#latitude:{}", site.latitude)?;
    writeln!(out, "#longitude:{}", site.longitude)?;
    writeln!(out, "#plate_name:{}", resolved.name)?;
    writeln!(out, "#plate_id:{}", resolved.id)?;
    writeln!(out, "#CSV")?;
    write_csv(&mut out, entries, plates)?;
    writeln!(out)?;
    writeln!(out, "#KML")?;
    write_kml(&mut out, site, resolved.id, plates)?;
    Ok(())
}

/// One-line summary of an aggregated result.
///
/// With a point age the line gives the value and its bounds; otherwise it
/// gives the latitude range over the age window.
pub fn summary_line(site: &Coordinate, summary: &PaleolatitudeEntry, point_age: bool) -> String {
    let myr = |years: u64| years as f64 / 1_000_000.0;
    let mut line = format!(
        "The paleolatitude of site ({},{}) ",
        site.latitude, site.longitude
    );

    if point_age && is_valid_latitude(summary.palat) {
        line.push_str(&format!(
            "at age {} Myr is: {}",
            myr(summary.age_years),
            summary.palat
        ));
        if summary.has_bounds() {
            line.push_str(&format!(
                " (bounds: [{},{}]",
                summary.palat_min, summary.palat_max
            ));
            if summary.age_years_lower_bound != summary.age_years
                || summary.age_years_upper_bound != summary.age_years
            {
                line.push_str(&format!(
                    " for age range [{},{}] Myr",
                    myr(summary.age_years_lower_bound),
                    myr(summary.age_years_upper_bound)
                ));
            }
            line.push(')');
        } else {
            line.push_str(" (bounds n/a)");
        }
    } else {
        line.push_str(&format!(
            "in age range [{},{}] Myr is: [{},{}]",
            myr(summary.age_years_lower_bound),
            myr(summary.age_years_upper_bound),
            summary.palat_min,
            summary.palat_max
        ));
    }
    line
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geomath::INVALID_LATITUDE;

    fn square(id: u32, name: &str, lat0: f64, lon0: f64, lat1: f64, lon1: f64) -> Plate {
        Plate::new(
            id,
            name,
            vec![
                Coordinate::new(lat0, lon0),
                Coordinate::new(lat0, lon1),
                Coordinate::new(lat1, lon1),
                Coordinate::new(lat1, lon0),
            ],
        )
    }

    fn plates() -> PlateDataset {
        PlateDataset::new(vec![
            square(701, "Africa", -45.0, 10.0, 5.0, 40.0),
            square(101, "North America", 30.0, -120.0, 60.0, -70.0),
        ])
    }

    fn entries() -> Vec<PaleolatitudeEntry> {
        let mut interpolated = PaleolatitudeEntry::new(12_500_000, -40.0, -35.123456, -30.0, 701);
        interpolated.is_interpolated = true;
        vec![
            PaleolatitudeEntry::new(10_000_000, -39.5, -34.5, -29.5, 701),
            interpolated,
            PaleolatitudeEntry::new(20_000_000, INVALID_LATITUDE, -36.0, INVALID_LATITUDE, 555),
        ]
    }

    #[test]
    fn test_csv() {
        let mut buf = Vec::new();
        write_csv(&mut buf, &entries(), &plates()).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "age;latitude;lower bound;upper bound;interpolated;relative_to");
        assert_eq!(lines[1], "10.00;-34.50000;-39.50000;-29.50000;0;Africa (701)");
        assert_eq!(lines[2], "12.50;-35.12346;-40.00000;-30.00000;1;Africa (701)");
        assert_eq!(lines[3], "20.00;-36.00000;;;0;Plate 555");
        assert_eq!(lines.len(), 4);
    }

    #[test]
    fn test_kml() {
        let mut buf = Vec::new();
        let site = Coordinate::new(-33.925278, 18.423889);
        write_kml(&mut buf, &site, 701, &plates()).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert!(text.starts_with("<?xml version=\"1.0\" encoding=\"UTF-8\"?>"));
        assert!(text.contains("<name>paleolatitude.org</name>"));
        assert!(text.contains("<coordinates>18.423889,-33.925278</coordinates>"));
        assert!(text.contains("<name>Africa (701)</name>"));
        assert!(text.contains("<color>ff0000ff</color>"));
        assert!(text.contains("<color>440000ff</color>"));
        assert!(text.contains("<coordinates>10,-45 40,-45 40,5 10,5</coordinates>"));
        assert!(text.contains("<styleUrl>#paleolatitude_site_default</styleUrl>"));

        // Output must be readable by the plate reader's XML layer
        let mut reader = quick_xml::Reader::from_str(&text);
        let mut buf = Vec::new();
        loop {
            let eof = matches!(reader.read_event_into(&mut buf).unwrap(), Event::Eof);
            buf.clear();
            if eof {
                break;
            }
        }
    }

    #[test]
    fn test_machine_readable() {
        let plates = plates();
        let mut buf = Vec::new();
        let site = Coordinate::new(-33.925278, 18.423889);
        write_machine_readable(&mut buf, &site, &plates.plates()[0], &entries(), &plates).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "#latitude:-33.925278");
        assert_eq!(lines[1], "#longitude:18.423889");
        assert_eq!(lines[2], "#plate_name:Africa");
        assert_eq!(lines[3], "#plate_id:701");
        assert_eq!(lines[4], "#CSV");
        assert!(lines[5].starts_with("age;latitude"));
        assert_eq!(lines[9], "");
        assert_eq!(lines[10], "#KML");
        assert!(lines[11].starts_with("<?xml"));
    }

    #[test]
    fn test_summary_line() {
        let site = Coordinate::new(-33.9, 18.4);

        let mut point = PaleolatitudeEntry::new(50_000_000, -45.0, -40.0, -35.0, 701);
        assert_eq!(
            summary_line(&site, &point, true),
            "The paleolatitude of site (-33.9,18.4) at age 50 Myr is: -40 (bounds: [-45,-35])"
        );

        point.age_years_lower_bound = 45_000_000;
        point.age_years_upper_bound = 55_000_000;
        assert_eq!(
            summary_line(&site, &point, true),
            "The paleolatitude of site (-33.9,18.4) at age 50 Myr is: -40 (bounds: [-45,-35] for age range [45,55] Myr)"
        );

        let no_bounds = PaleolatitudeEntry::new(50_000_000, INVALID_LATITUDE, -40.0, INVALID_LATITUDE, 701);
        assert!(summary_line(&site, &no_bounds, true).ends_with("is: -40 (bounds n/a)"));

        let mut range = PaleolatitudeEntry::new(0, -50.0, INVALID_LATITUDE, -30.0, 701);
        range.age_years_upper_bound = 200_000_000;
        assert_eq!(
            summary_line(&site, &range, false),
            "The paleolatitude of site (-33.9,18.4) in age range [0,200] Myr is: [-50,-30]"
        );
    }
}
