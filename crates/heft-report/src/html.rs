//! Self-contained HTML report.

use heft_core::{Analysis, SizeKind};
use serde_json::json;

const TEMPLATE: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>{{title}}</title>
<style>
  body { font: 14px/1.4 system-ui, sans-serif; margin: 2rem; color: #1d1d1f; }
  h1 { font-size: 1.4rem; margin-bottom: .25rem; }
  .totals { color: #666; margin-bottom: 1rem; }
  .controls button { margin-right: .25rem; }
  .controls button.active { font-weight: bold; }
  ul { list-style: none; padding-left: 1.1rem; margin: 0; }
  li > details > summary, li > .leaf { cursor: default; display: flex; gap: .5rem; }
  .bar { background: #7aa7e8; height: .8rem; align-self: center; min-width: 1px; }
  .size { color: #555; font-variant-numeric: tabular-nums; }
  .kind { color: #999; font-size: .8rem; }
  .diagnostics li { color: #a15c00; }
</style>
</head>
<body>
<h1>{{title}}</h1>
<div class="totals" id="totals"></div>
<div class="controls" id="controls"></div>
<div id="tree"></div>
<ul class="diagnostics" id="diagnostics"></ul>
<script id="heft-data" type="application/json">{{data}}</script>
<script>
(function () {
  var data = JSON.parse(document.getElementById("heft-data").textContent);
  var keys = { parsed: "parsedSize", gzip: "gzipSize", map: "mapSize" };
  var current = data.defaultSizes;

  function size(node) {
    return node[keys[current]] || 0;
  }

  function fmt(bytes) {
    if (bytes >= 1048576) return (bytes / 1048576).toFixed(2) + " MB";
    if (bytes >= 1024) return (bytes / 1024).toFixed(1) + " KB";
    return bytes + " bytes";
  }

  function render(node, total) {
    var li = document.createElement("li");
    var children = (node.children || []).slice().sort(function (a, b) { return size(b) - size(a); });
    var label = '<span class="bar" style="width:' + Math.max(1, Math.round(200 * size(node) / (total || 1))) + 'px"></span>' +
      "<span>" + escape(node.name) + "</span>" +
      '<span class="size">' + fmt(size(node)) + "</span>" +
      '<span class="kind">' + node.kind + "</span>";
    if (children.length) {
      var details = document.createElement("details");
      var summary = document.createElement("summary");
      summary.innerHTML = label;
      details.appendChild(summary);
      var ul = document.createElement("ul");
      children.forEach(function (child) { ul.appendChild(render(child, total)); });
      details.appendChild(ul);
      li.appendChild(details);
    } else {
      var span = document.createElement("span");
      span.className = "leaf";
      span.innerHTML = label;
      li.appendChild(span);
    }
    return li;
  }

  function escape(text) {
    return String(text).replace(/[&<>"]/g, function (c) {
      return { "&": "&amp;", "<": "&lt;", ">": "&gt;", '"': "&quot;" }[c];
    });
  }

  function draw() {
    var root = data.analysis.tree;
    var total = size(root);
    document.getElementById("totals").textContent =
      "parsed " + fmt(root.parsedSize) + " · gzip " + fmt(root.gzipSize) + " · map " + fmt(root.mapSize);
    var ul = document.createElement("ul");
    (root.children || []).slice().sort(function (a, b) { return size(b) - size(a); })
      .forEach(function (child) { ul.appendChild(render(child, total)); });
    var tree = document.getElementById("tree");
    tree.innerHTML = "";
    tree.appendChild(ul);
    var controls = document.getElementById("controls");
    controls.innerHTML = "";
    Object.keys(keys).forEach(function (kind) {
      var button = document.createElement("button");
      button.textContent = kind;
      if (kind === current) button.className = "active";
      button.onclick = function () { current = kind; draw(); };
      controls.appendChild(button);
    });
  }

  data.analysis.diagnostics.forEach(function (d) {
    var li = document.createElement("li");
    li.textContent = d.kind.replace(/_/g, " ") + ": " + d.chunk;
    document.getElementById("diagnostics").appendChild(li);
  });
  draw();
})();
</script>
</body>
</html>
"#;

/// Renders the page for `analysis`, sorted by `default_sizes` on load.
pub fn render_html(
    title: &str,
    default_sizes: SizeKind,
    analysis: &Analysis,
) -> serde_json::Result<String> {
    let data = json!({
        "title": title,
        "defaultSizes": default_sizes,
        "analysis": analysis,
    });
    let data = escape_script(&serde_json::to_string(&data)?);

    Ok(TEMPLATE
        .replace("{{title}}", &escape_text(title))
        .replace("{{data}}", &data))
}

/// Keeps embedded JSON from closing the surrounding `<script>` element.
/// `<` only occurs inside JSON strings, where `\u003c` is equivalent.
fn escape_script(json: &str) -> String {
    json.replace('<', "\\u003c")
}

fn escape_text(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '{' => escaped.push_str("&#123;"),
            _ => escaped.push(c),
        }
    }
    escaped
}
