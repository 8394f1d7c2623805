use geo::{Coord, CoordsIter, Geometry, LineString};

/// Projection function: data coords -> SVG coords (x,y)
pub(crate) type Projection<'a> = dyn Fn(&Coord<f64>) -> (f64, f64) + 'a;

/// Three decimals, with trailing zeros and negative zero dropped.
pub(crate) fn fmt_num(value: f64) -> String {
    let rounded = (value * 1000.0).round() / 1000.0;
    if rounded == 0.0 {
        return "0".to_string();
    }
    let text = format!("{:.3}", rounded);
    text.trim_end_matches('0').trim_end_matches('.').to_string()
}

/// Build the outline path of any geometry. Points contribute nothing.
pub(crate) fn geometry_to_path(geometry: &Geometry<f64>, project: &Projection<'_>) -> String {
    let mut out = String::new();
    push_geometry(geometry, project, &mut out);
    out
}

fn push_geometry(geometry: &Geometry<f64>, project: &Projection<'_>, out: &mut String) {
    match geometry {
        Geometry::Point(_) | Geometry::MultiPoint(_) => {}
        Geometry::Line(line) => push_line(&LineString::from(vec![line.start, line.end]), project, out),
        Geometry::LineString(line) => push_line(line, project, out),
        Geometry::MultiLineString(lines) => {
            for line in lines {
                push_line(line, project, out);
            }
        }
        Geometry::Polygon(polygon) => {
            push_ring(polygon.exterior(), project, out);
            for hole in polygon.interiors() {
                push_ring(hole, project, out);
            }
        }
        Geometry::MultiPolygon(polygons) => {
            for polygon in polygons {
                push_ring(polygon.exterior(), project, out);
                for hole in polygon.interiors() {
                    push_ring(hole, project, out);
                }
            }
        }
        Geometry::Rect(rect) => push_ring(rect.to_polygon().exterior(), project, out),
        Geometry::Triangle(triangle) => push_ring(triangle.to_polygon().exterior(), project, out),
        Geometry::GeometryCollection(collection) => {
            for child in collection {
                push_geometry(child, project, out);
            }
        }
    }
}

/// Append an open polyline: "Mx,yLx,y..."
fn push_line(line: &LineString<f64>, project: &Projection<'_>, out: &mut String) {
    let mut coords = line.coords_iter().map(|c| project(&c));
    if let Some((x, y)) = coords.next() {
        out.push_str(&format!("M{},{}", fmt_num(x), fmt_num(y)));
        for (x, y) in coords {
            out.push_str(&format!("L{},{}", fmt_num(x), fmt_num(y)));
        }
    }
}

/// Append a closed ring: "Mx,yLx,y...Z". The repeated closing vertex is dropped.
fn push_ring(ring: &LineString<f64>, project: &Projection<'_>, out: &mut String) {
    let mut coords: Vec<Coord<f64>> = ring.coords_iter().collect();
    if coords.len() > 1 && coords.first() == coords.last() {
        coords.pop();
    }
    let mut projected = coords.iter().map(|c| project(c));
    if let Some((x, y)) = projected.next() {
        out.push_str(&format!("M{},{}", fmt_num(x), fmt_num(y)));
        for (x, y) in projected {
            out.push_str(&format!("L{},{}", fmt_num(x), fmt_num(y)));
        }
        out.push('Z');
    }
}
