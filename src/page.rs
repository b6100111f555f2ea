use std::fmt::Write;

use serde::Serialize;

use crate::dashboard::YearView;
use crate::map::MapView;
use crate::severity::Severity;

pub const MAP_WIDTH: u32 = 1000;
pub const MAP_HEIGHT: u32 = 650;
const TITLE: &str = "Interactieve meetdata kaart";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageMode<'a> {
    /// Year dropdown submits back to `action`.
    Interactive { action: &'a str },
    /// Written to disk; the selected year is shown as plain text.
    Static,
}

#[derive(Serialize)]
struct MapScript<'a> {
    view: &'a MapView,
    tile_url: &'static str,
    attribution: &'static str,
}

/// `12345` -> `12,345`.
pub fn format_count(count: usize) -> String {
    let digits = count.to_string();
    let mut output = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            output.push(',');
        }
        output.push(ch);
    }
    output
}

fn map_json(map: &MapView) -> serde_json::Result<String> {
    let script = MapScript {
        view: map,
        tile_url: map.tiles.url_template(),
        attribution: map.tiles.attribution(),
    };
    // Keeps `</script>` inside a string from closing the data block.
    Ok(serde_json::to_string(&script)?.replace("</", "<\\/"))
}

pub fn build_page(view: &YearView, mode: PageMode<'_>) -> serde_json::Result<String> {
    let data = map_json(&view.map)?;
    let mut output = String::new();

    let _ = writeln!(output, "<!DOCTYPE html>");
    let _ = writeln!(output, "<html lang=\"nl\">");
    let _ = writeln!(output, "<head>");
    let _ = writeln!(output, "  <meta charset=\"utf-8\">");
    let _ = writeln!(output, "  <title>{TITLE}</title>");
    let _ = writeln!(
        output,
        "  <link rel=\"stylesheet\" href=\"https://unpkg.com/leaflet@1.9.4/dist/leaflet.css\">"
    );
    let _ = writeln!(
        output,
        "  <link rel=\"stylesheet\" href=\"https://unpkg.com/leaflet.markercluster@1.4.1/dist/MarkerCluster.css\">"
    );
    let _ = writeln!(
        output,
        "  <link rel=\"stylesheet\" href=\"https://unpkg.com/leaflet.markercluster@1.4.1/dist/MarkerCluster.Default.css\">"
    );
    let _ = writeln!(
        output,
        "  <script src=\"https://unpkg.com/leaflet@1.9.4/dist/leaflet.js\"></script>"
    );
    let _ = writeln!(
        output,
        "  <script src=\"https://unpkg.com/leaflet.markercluster@1.4.1/dist/leaflet.markercluster.js\"></script>"
    );
    let _ = writeln!(
        output,
        "  <style>body {{ font-family: sans-serif; margin: 1.5rem; }} \
         #map {{ width: {MAP_WIDTH}px; height: {MAP_HEIGHT}px; }} \
         .swatch {{ display: inline-block; width: 12px; height: 12px; border-radius: 6px; }}</style>"
    );
    let _ = writeln!(output, "</head>");
    let _ = writeln!(output, "<body>");
    let _ = writeln!(output, "<h1>{TITLE}</h1>");

    write_year_selector(&mut output, view, mode);

    match view.year {
        Some(year) => {
            let _ = writeln!(
                output,
                "<p id=\"count\">Aantal meetpunten in {year}: <b>{}</b></p>",
                format_count(view.count)
            );
        }
        None => {
            let _ = writeln!(
                output,
                "<p id=\"count\">Geen gedateerde meetpunten: <b>0</b></p>"
            );
        }
    }

    let _ = writeln!(output, "<div id=\"map\"></div>");
    let _ = writeln!(
        output,
        "<script type=\"application/json\" id=\"map-data\">{data}</script>"
    );
    let _ = writeln!(output, "<script>{MAP_SCRIPT}</script>");

    write_legend(&mut output);

    let _ = writeln!(output, "</body>");
    let _ = writeln!(output, "</html>");
    Ok(output)
}

fn write_year_selector(output: &mut String, view: &YearView, mode: PageMode<'_>) {
    match mode {
        PageMode::Interactive { action } => {
            let _ = writeln!(output, "<form method=\"get\" action=\"{action}\">");
            let _ = writeln!(output, "  <label for=\"year\">Kies een kalenderjaar:</label>");
            let _ = writeln!(
                output,
                "  <select id=\"year\" name=\"year\" onchange=\"this.form.submit()\">"
            );
            for year in &view.years {
                let selected = if Some(*year) == view.year { " selected" } else { "" };
                let _ = writeln!(output, "    <option value=\"{year}\"{selected}>{year}</option>");
            }
            let _ = writeln!(output, "  </select>");
            let _ = writeln!(output, "  <noscript><button type=\"submit\">Toon</button></noscript>");
            let _ = writeln!(output, "</form>");
        }
        PageMode::Static => {
            if let Some(year) = view.year {
                let _ = writeln!(output, "<p>Kalenderjaar: <b>{year}</b></p>");
            }
        }
    }
}

fn write_legend(output: &mut String) {
    let _ = writeln!(output, "<h3>Legenda</h3>");
    let _ = writeln!(output, "<table id=\"legend\">");
    let _ = writeln!(output, "  <tr><th>Kleur</th><th>Waarde (Ruw.Res.)</th></tr>");
    for severity in Severity::ALL {
        let _ = writeln!(
            output,
            "  <tr><td><span class=\"swatch\" style=\"background:{}\"></span> {}</td><td>{}</td></tr>",
            severity.color(),
            severity.legend_label(),
            severity.range_label()
        );
    }
    let _ = writeln!(output, "</table>");
}

const MAP_SCRIPT: &str = r#"
(function () {
  const data = JSON.parse(document.getElementById('map-data').textContent);
  const view = data.view;
  const map = L.map('map').setView([view.center.lat, view.center.lon], view.zoom);
  L.tileLayer(data.tile_url, {
    attribution: data.attribution,
    subdomains: 'abcd',
    maxZoom: 20
  }).addTo(map);

  const cluster = L.markerClusterGroup();
  for (const m of view.markers) {
    const popup = document.createElement('div');
    m.popup.lines.forEach(function (line, i) {
      const node = document.createElement(i === 0 ? 'b' : 'div');
      node.textContent = line;
      popup.appendChild(node);
    });
    L.circleMarker([m.lat, m.lon], {
      radius: view.radius,
      color: m.color,
      fill: true,
      fillColor: m.color,
      fillOpacity: view.fill_opacity
    }).bindPopup(popup).addTo(cluster);
  }
  cluster.addTo(map);

  const overlays = {};
  overlays[view.layer_name] = cluster;
  L.control.layers(null, overlays).addTo(map);
})();
"#;
