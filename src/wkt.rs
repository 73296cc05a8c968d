//! Minimal WKT support for the two geometry types the document store uses:
//! `POINT (x y)` and `LINESTRING (x y, x y, ...)`.
//!
//! Coordinates are written with Rust's shortest round-trip float format, so
//! a write followed by a read returns the same `f64` values.

use geo::Coord;

/// Format a `POINT` WKT.
pub fn point_wkt(c: Coord<f64>) -> String {
    format!("POINT ({} {})", c.x, c.y)
}

/// Format a `LINESTRING` WKT.
///
/// A single coordinate is repeated so the result stays a valid two-point
/// linestring.
pub fn linestring_wkt(coords: &[Coord<f64>]) -> String {
    let body: Vec<String> = match coords {
        [only] => vec![format!("{} {}", only.x, only.y); 2],
        _ => coords.iter().map(|c| format!("{} {}", c.x, c.y)).collect(),
    };
    format!("LINESTRING ({})", body.join(", "))
}

/// Parse a `POINT` WKT.
pub fn parse_point(text: &str) -> Result<Coord<f64>, String> {
    let body = tagged_body(text, "POINT")?;
    parse_coord(body)
}

/// Parse a `LINESTRING` WKT.
pub fn parse_linestring(text: &str) -> Result<Vec<Coord<f64>>, String> {
    let body = tagged_body(text, "LINESTRING")?;
    body.split(',').map(parse_coord).collect()
}

/// Strip `TAG ( ... )` and return the text between the parentheses.
fn tagged_body<'a>(text: &'a str, tag: &str) -> Result<&'a str, String> {
    let text = text.trim();
    let (head, rest) = text
        .split_once('(')
        .ok_or_else(|| format!("expected '{tag} (...)', got '{text}'"))?;
    if !head.trim().eq_ignore_ascii_case(tag) {
        return Err(format!("expected {tag}, got '{}'", head.trim()));
    }
    let body = rest
        .strip_suffix(')')
        .ok_or_else(|| format!("unterminated {tag}: '{text}'"))?;
    if body.contains('(') || body.contains(')') {
        return Err(format!("nested parentheses in {tag}: '{text}'"));
    }
    Ok(body)
}

fn parse_coord(pair: &str) -> Result<Coord<f64>, String> {
    let mut parts = pair.split_whitespace();
    let (Some(x), Some(y), None) = (parts.next(), parts.next(), parts.next()) else {
        return Err(format!("expected 'x y', got '{}'", pair.trim()));
    };
    let x: f64 = x.parse().map_err(|_| format!("invalid x coordinate '{x}'"))?;
    let y: f64 = y.parse().map_err(|_| format!("invalid y coordinate '{y}'"))?;
    if !x.is_finite() || !y.is_finite() {
        return Err(format!("non-finite coordinate '{}'", pair.trim()));
    }
    Ok(Coord { x, y })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_point() {
        let c = parse_point("POINT (12.5 -3)").unwrap();
        assert_eq!(c, Coord { x: 12.5, y: -3.0 });
        assert!(parse_point("point(1 2)").is_ok());
    }

    #[test]
    fn test_parse_point_rejects_garbage() {
        assert!(parse_point("POINT (1)").is_err());
        assert!(parse_point("POINT (1 2 3)").is_err());
        assert!(parse_point("POINT (a b)").is_err());
        assert!(parse_point("LINESTRING (1 2, 3 4)").is_err());
        assert!(parse_point("POINT 1 2").is_err());
    }

    #[test]
    fn test_linestring_roundtrip_exact() {
        let coords = vec![Coord { x: 0.1, y: 0.2 }, Coord { x: 1.0 / 3.0, y: 1e-7 }];
        let parsed = parse_linestring(&linestring_wkt(&coords)).unwrap();
        assert_eq!(parsed, coords);
    }

    #[test]
    fn test_single_coord_linestring() {
        let text = linestring_wkt(&[Coord { x: 1.0, y: 2.0 }]);
        assert_eq!(text, "LINESTRING (1 2, 1 2)");
    }
}
