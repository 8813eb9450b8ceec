use std::io::{stdout, Write};

use anyhow::{Context, Result};
use handlebars::handlebars_helper;
use ngham::framing::{SizeClass, SIZE_CLASSES};
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
struct Row {
    #[serde(flatten)]
    class: SizeClass,
    tag_hex: String,
    pad: usize,
}

/// Render `data` with a handlebars `template`, providing the `lpad` helper.
pub fn render<T: Serialize>(name: &str, template: &str, data: &T) -> Result<String> {
    handlebars_helper!(left_pad: |num: u64, v: Json| {
        let v = match v {
            serde_json::Value::String(s) => s.to_owned(),
            serde_json::Value::Null => String::new(),
            _ => v.to_string()
        };
        let num = usize::try_from(num).unwrap_or(0).max(v.len());
        format!("{v:>num$}")
    });
    let mut hb = handlebars::Handlebars::new();
    hb.register_helper("lpad", Box::new(left_pad));
    hb.register_template_string(name, template)
        .with_context(|| format!("registering {name} template"))?;

    hb.render(name, data).context("rendering text")
}

fn rows() -> Vec<Row> {
    SIZE_CLASSES
        .iter()
        .map(|class| Row {
            class: *class,
            tag_hex: format!("{:06X}", class.tag),
            pad: class.pad(),
        })
        .collect()
}

pub fn sizes() -> Result<()> {
    let text = render("sizes", TEXT_TEMPLATE, &rows())?;
    stdout()
        .write_all(text.as_bytes())
        .context("writing to stdout")
}

const TEXT_TEMPLATE: &str = r"Class  Capacity  Data  Parity  Pad  Tag
---------------------------------------------
{{ #each this }}{{ lpad 5 index }}  {{ lpad 8 capacity }}  {{ lpad 4 data_len }}  {{ lpad 6 parity_len }}  {{ lpad 3 pad }}  {{ tag_hex }}
{{/each }}";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sizes_table() {
        let text = render("sizes", TEXT_TEMPLATE, &rows()).unwrap();
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines.len(), 2 + SIZE_CLASSES.len(), "{text}");
        assert_eq!(lines[2], "    0        28    31      16  208  3B49CD");
        assert_eq!(lines[8], "    6       220   223      32    0  ED2734");
    }
}
