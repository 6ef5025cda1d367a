//! Layout-driven rendering.

use crate::layout::{FieldKind, FieldSpec, Layout};
use crate::metrics::{truncate_to_width, with_ellipsis, wrap_text};
use crate::signature::SignatureImage;
use crate::stamp::Stamper;
use crate::values::{FieldValue, FieldValues};
use crate::{PdfError, PdfResult};

/// Fills `template` with `values` according to `layout` and returns the resulting PDF.
///
/// # Errors
///
/// Returns an error if the template cannot be parsed, has fewer pages than the layout needs,
/// or the output cannot be written.
pub fn render(template: &[u8], layout: &Layout, values: &FieldValues) -> PdfResult<Vec<u8>> {
    let mut stamper = Stamper::from_bytes(template)?;
    fill(&mut stamper, layout, values)?;
    stamper.finish()
}

/// Queues every present value of `layout` onto `stamper`, returning how many fields were drawn.
///
/// Fields without a value are skipped. So are values whose type does not fit the field and
/// signatures that fail to decode; both are logged.
pub fn fill(stamper: &mut Stamper, layout: &Layout, values: &FieldValues) -> PdfResult<usize> {
    let required = layout.required_pages();
    if required > stamper.page_count() {
        return Err(PdfError::PageOutOfRange {
            page: required - 1,
            count: stamper.page_count(),
        });
    }

    let mut drawn = 0;
    for spec in layout.fields {
        let Some(value) = values.get(spec.key) else {
            continue;
        };
        if draw_field(stamper, spec, value)? {
            drawn += 1;
        }
    }

    tracing::debug!(layout = layout.name, drawn, "filled layout");
    Ok(drawn)
}

fn draw_field(stamper: &mut Stamper, spec: &FieldSpec, value: &FieldValue) -> PdfResult<bool> {
    match (&spec.kind, value) {
        (FieldKind::Text { size, max_width }, FieldValue::Text(text)) => {
            let line = truncate_to_width(&single_line(text), *size, *max_width);
            stamper.draw_text(spec.page, spec.x, spec.y, *size, &line)?;
        }
        (
            FieldKind::Paragraph {
                size,
                max_width,
                line_height,
                max_lines,
            },
            FieldValue::Text(text),
        ) => {
            let lines = limit_lines(wrap_text(text, *size, *max_width), *max_lines, *size, *max_width);
            for (i, line) in lines.iter().enumerate() {
                let y = spec.y - i as f32 * line_height;
                stamper.draw_text(spec.page, spec.x, y, *size, line)?;
            }
        }
        (FieldKind::Check { size }, FieldValue::Checked(checked)) => {
            if !checked {
                return Ok(false);
            }
            stamper.draw_check(spec.page, spec.x, spec.y, *size)?;
        }
        (FieldKind::Signature { width, height }, FieldValue::Signature(data)) => {
            let image = match SignatureImage::decode(data) {
                Ok(image) => image,
                Err(e) => {
                    tracing::warn!(field = spec.key, error = %e, "signature skipped");
                    return Ok(false);
                }
            };
            let (w, h) = image.fit_within(*width, *height);
            stamper.draw_image(spec.page, spec.x, spec.y, w, h, &image)?;
        }
        (
            FieldKind::Rows {
                size,
                row_height,
                max_rows,
                columns,
            },
            FieldValue::Rows(rows),
        ) => {
            if rows.len() > *max_rows {
                tracing::warn!(
                    field = spec.key,
                    rows = rows.len(),
                    max_rows,
                    "rows beyond the table capacity were dropped"
                );
            }
            for (i, row) in rows.iter().take(*max_rows).enumerate() {
                let y = spec.y - i as f32 * row_height;
                for column in columns.iter() {
                    let Some(cell) = row.get(column.key) else {
                        continue;
                    };
                    let cell = truncate_to_width(&single_line(cell), *size, column.max_width);
                    stamper.draw_text(spec.page, spec.x + column.x_offset, y, *size, &cell)?;
                }
            }
        }
        _ => {
            tracing::warn!(field = spec.key, "value does not match the field kind; skipped");
            return Ok(false);
        }
    }
    Ok(true)
}

fn single_line(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn limit_lines(mut lines: Vec<String>, max_lines: usize, size: f32, max_width: f32) -> Vec<String> {
    if lines.len() <= max_lines {
        return lines;
    }
    lines.truncate(max_lines);
    if let Some(last) = lines.last_mut() {
        *last = with_ellipsis(last, size, max_width);
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::Column;
    use crate::metrics::{text_width, ELLIPSIS};
    use crate::signature::tests::signature_png_base64;
    use crate::template::blank_template;
    use crate::values::Row;

    static MED_COLUMNS: [Column; 2] = [
        Column {
            key: "name",
            x_offset: 0.0,
            max_width: 120.0,
        },
        Column {
            key: "dose",
            x_offset: 130.0,
            max_width: 60.0,
        },
    ];

    static FIELDS: [FieldSpec; 6] = [
        FieldSpec::text("patientName", 0, 72.0, 700.0, 10.0, 200.0),
        FieldSpec::paragraph("notes", 0, 72.0, 600.0, 9.0, 150.0, 11.0, 2),
        FieldSpec::check("consent", 1, 72.0, 500.0, 10.0),
        FieldSpec::check("refused", 1, 72.0, 480.0, 10.0),
        FieldSpec::signature("patientSignature", 1, 300.0, 100.0, 150.0, 40.0),
        FieldSpec::rows("medications", 1, 72.0, 400.0, 9.0, 12.0, 2, &MED_COLUMNS),
    ];

    static LAYOUT: Layout = Layout {
        name: "test",
        fields: &FIELDS,
    };

    fn med(name: &str, dose: &str) -> Row {
        let mut row = Row::new();
        row.insert("name".into(), name.into());
        row.insert("dose".into(), dose.into());
        row
    }

    #[test]
    fn test_fill_counts_drawn_fields() {
        let mut stamper = Stamper::from_bytes(&blank_template(2).unwrap()).unwrap();
        let values = FieldValues::new()
            .text("patientName", Some("Jane Doe"))
            .text("notes", Some("Short note"))
            .check("consent", true)
            .check("refused", false)
            .signature("patientSignature", Some(signature_png_base64(60, 20)))
            .rows("medications", vec![med("Metformin", "500 mg")]);

        let drawn = fill(&mut stamper, &LAYOUT, &values).unwrap();
        // refused=false draws nothing
        assert_eq!(drawn, 5);
    }

    #[test]
    fn test_fill_skips_mismatched_and_bad_signature() {
        let mut stamper = Stamper::from_bytes(&blank_template(2).unwrap()).unwrap();
        let values = FieldValues::new()
            .check("patientName", true)
            .signature("patientSignature", Some("definitely not an image"));

        let drawn = fill(&mut stamper, &LAYOUT, &values).unwrap();
        assert_eq!(drawn, 0);
    }

    #[test]
    fn test_fill_rejects_short_template() {
        let mut stamper = Stamper::from_bytes(&blank_template(1).unwrap()).unwrap();
        let err = fill(&mut stamper, &LAYOUT, &FieldValues::new()).unwrap_err();
        assert!(matches!(err, PdfError::PageOutOfRange { page: 1, count: 1 }));
    }

    #[test]
    fn test_render_end_to_end() {
        let template = blank_template(2).unwrap();
        let values = FieldValues::new()
            .text("patientName", Some("Jane Doe"))
            .rows(
                "medications",
                vec![
                    med("Metformin", "500 mg"),
                    med("Lisinopril", "10 mg"),
                    med("Dropped", "1 mg"),
                ],
            );

        let bytes = render(&template, &LAYOUT, &values).unwrap();
        let doc = lopdf::Document::load_mem(&bytes).unwrap();
        assert_eq!(doc.get_pages().len(), 2);
    }

    #[test]
    fn test_rows_beyond_capacity_are_not_drawn() {
        let template = blank_template(2).unwrap();
        let values = FieldValues::new().rows(
            "medications",
            vec![
                med("Metformin", "500 mg"),
                med("Lisinopril", "10 mg"),
                med("Warfarin", "5 mg"),
            ],
        );

        let bytes = render(&template, &LAYOUT, &values).unwrap();
        let doc = lopdf::Document::load_mem(&bytes).unwrap();
        let page_id = doc.get_pages()[&2];
        let overlay_id = doc
            .get_page_contents(page_id)
            .last()
            .copied()
            .unwrap();
        let stream = doc.get_object(overlay_id).unwrap().as_stream().unwrap();
        let raw = stream
            .decompressed_content()
            .unwrap_or_else(|_| stream.content.clone());
        let content = String::from_utf8_lossy(&raw).into_owned();

        // two rows of two cells each
        assert_eq!(content.matches("/FStamp").count(), 4);
        assert!(content.contains("(Metformin)"));
        assert!(content.contains("(Lisinopril)"));
        assert!(!content.contains("Warfarin"));

        let mut baselines: Vec<f32> = lopdf::content::Content::decode(&raw)
            .unwrap()
            .operations
            .iter()
            .filter(|op| op.operator == "Td" && op.operands[0].as_float().unwrap() == 72.0)
            .map(|op| op.operands[1].as_float().unwrap())
            .collect();
        baselines.dedup();
        assert_eq!(baselines, vec![400.0, 388.0]);
    }

    #[test]
    fn test_limit_lines_adds_ellipsis() {
        let lines = vec!["one line".to_string(), "two line".into(), "three".into()];
        let limited = limit_lines(lines, 2, 9.0, 150.0);
        assert_eq!(limited.len(), 2);
        assert_eq!(limited[1], format!("two line{}", ELLIPSIS));
        assert!(text_width(&limited[1], 9.0) <= 150.0);
    }

    #[test]
    fn test_single_line_collapses_whitespace() {
        assert_eq!(single_line("123 Main St\nApt 4"), "123 Main St Apt 4");
    }
}
