use std::io::Write;
use std::path::Path;

use crate::error::TraceError;
use crate::outline::Outline;

/// Serialize an outline as a standalone SVG document.
///
/// Each root contour and everything nested in it becomes one `<path>`
/// filled with the nonzero rule; holes cut out because they run opposite
/// to their parents. The `viewBox` is the grid itself.
pub fn to_svg(outline: &Outline) -> String {
    let (w, h) = (outline.width(), outline.height());
    let mut svg = format!(
        "<svg xmlns=\"http://www.w3.org/2000/svg\" version=\"1.1\" width=\"{w}\" height=\"{h}\" viewBox=\"0 0 {w} {h}\">\n"
    );
    for root in outline.roots() {
        let d = outline.group_bezpath(root).to_svg();
        svg.push_str(&format!("  <path fill=\"black\" fill-rule=\"nonzero\" d=\"{d}\"/>\n"));
    }
    svg.push_str("</svg>\n");
    svg
}

/// Write the SVG document to `path`.
pub fn write_svg(outline: &Outline, path: &Path) -> Result<(), TraceError> {
    let mut file = std::io::BufWriter::new(std::fs::File::create(path)?);
    file.write_all(to_svg(outline).as_bytes())?;
    file.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bitmap::PixelGrid;
    use crate::config::TraceParams;

    #[test]
    fn one_path_per_root_group() {
        let grid = PixelGrid::from_ascii(&[
            "#####..###",
            "#...#..###",
            "#####..###",
        ])
        .unwrap();
        let params = TraceParams {
            speckle_size: 0,
            ..TraceParams::default()
        };
        let outline = crate::trace(&grid, &params).unwrap();
        assert_eq!(outline.roots().count(), 2);

        let svg = to_svg(&outline);
        assert!(svg.starts_with("<svg"));
        assert!(svg.contains(r#"viewBox="0 0 10 3""#));
        assert_eq!(svg.matches("<path").count(), 2, "{}", svg);
        // The ring's path carries both loops.
        assert_eq!(svg.matches('M').count(), 3, "{}", svg);
        assert!(svg.trim_end().ends_with("</svg>"));
        assert_eq!(svg.lines().count(), 4, "{}", svg);
    }

    #[test]
    fn empty_outline_is_a_bare_document() {
        let grid = PixelGrid::from_ascii(&["....", "...."]).unwrap();
        let outline = crate::trace(&grid, &TraceParams::default()).unwrap();
        let svg = to_svg(&outline);
        assert!(!svg.contains("<path"));
    }
}
