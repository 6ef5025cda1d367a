//! Static field layouts.
//!
//! A layout is a table of [`FieldSpec`]s. Each entry names the value key it draws, the
//! zero-based page index, the anchor point in PDF user space and how the value is drawn.
//! Layouts are declared as `static` tables next to the form they belong to.

/// One column of a [`FieldKind::Rows`] table.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Column {
    /// Key looked up in each row.
    pub key: &'static str,
    /// Horizontal offset from the field's `x`.
    pub x_offset: f32,
    /// Width available to the cell; longer text is truncated.
    pub max_width: f32,
}

/// How a field is drawn.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FieldKind {
    /// Single line of text, truncated with an ellipsis when wider than `max_width`.
    Text { size: f32, max_width: f32 },
    /// Greedily wrapped text. The first baseline sits at the field's `y`; following lines step
    /// down by `line_height`. Lines past `max_lines` are dropped and the last kept line gets an
    /// ellipsis.
    Paragraph {
        size: f32,
        max_width: f32,
        line_height: f32,
        max_lines: usize,
    },
    /// A checkmark in a `size` x `size` box whose bottom-left corner is the anchor.
    Check { size: f32 },
    /// A signature bitmap scaled to fit the box, aspect ratio preserved, anchored bottom-left.
    Signature { width: f32, height: f32 },
    /// Repeating rows (medication lists). Row `i` has its baseline at `y - i * row_height`.
    Rows {
        size: f32,
        row_height: f32,
        max_rows: usize,
        columns: &'static [Column],
    },
}

/// A single entry of a layout table.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FieldSpec {
    pub key: &'static str,
    pub page: usize,
    pub x: f32,
    pub y: f32,
    pub kind: FieldKind,
}

impl FieldSpec {
    pub const fn text(
        key: &'static str,
        page: usize,
        x: f32,
        y: f32,
        size: f32,
        max_width: f32,
    ) -> Self {
        Self {
            key,
            page,
            x,
            y,
            kind: FieldKind::Text { size, max_width },
        }
    }

    #[allow(clippy::too_many_arguments)]
    pub const fn paragraph(
        key: &'static str,
        page: usize,
        x: f32,
        y: f32,
        size: f32,
        max_width: f32,
        line_height: f32,
        max_lines: usize,
    ) -> Self {
        Self {
            key,
            page,
            x,
            y,
            kind: FieldKind::Paragraph {
                size,
                max_width,
                line_height,
                max_lines,
            },
        }
    }

    pub const fn check(key: &'static str, page: usize, x: f32, y: f32, size: f32) -> Self {
        Self {
            key,
            page,
            x,
            y,
            kind: FieldKind::Check { size },
        }
    }

    pub const fn signature(
        key: &'static str,
        page: usize,
        x: f32,
        y: f32,
        width: f32,
        height: f32,
    ) -> Self {
        Self {
            key,
            page,
            x,
            y,
            kind: FieldKind::Signature { width, height },
        }
    }

    #[allow(clippy::too_many_arguments)]
    pub const fn rows(
        key: &'static str,
        page: usize,
        x: f32,
        y: f32,
        size: f32,
        row_height: f32,
        max_rows: usize,
        columns: &'static [Column],
    ) -> Self {
        Self {
            key,
            page,
            x,
            y,
            kind: FieldKind::Rows {
                size,
                row_height,
                max_rows,
                columns,
            },
        }
    }
}

/// A named table of field placements for one template.
#[derive(Debug, Clone, Copy)]
pub struct Layout {
    pub name: &'static str,
    pub fields: &'static [FieldSpec],
}

impl Layout {
    /// Highest page index referenced, or `None` for an empty layout.
    pub fn max_page(&self) -> Option<usize> {
        self.fields.iter().map(|f| f.page).max()
    }

    /// Looks up the placement for `key`.
    pub fn field(&self, key: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.key == key)
    }

    /// Minimum number of pages a template needs to host this layout.
    pub fn required_pages(&self) -> usize {
        self.max_page().map_or(0, |p| p + 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    static COLUMNS: [Column; 2] = [
        Column {
            key: "name",
            x_offset: 0.0,
            max_width: 100.0,
        },
        Column {
            key: "dose",
            x_offset: 110.0,
            max_width: 50.0,
        },
    ];

    static FIELDS: [FieldSpec; 3] = [
        FieldSpec::text("patientName", 0, 72.0, 700.0, 10.0, 200.0),
        FieldSpec::check("consent", 1, 72.0, 600.0, 10.0),
        FieldSpec::rows("medications", 2, 72.0, 500.0, 9.0, 14.0, 10, &COLUMNS),
    ];

    static LAYOUT: Layout = Layout {
        name: "test",
        fields: &FIELDS,
    };

    #[test]
    fn test_max_page_and_required_pages() {
        assert_eq!(LAYOUT.max_page(), Some(2));
        assert_eq!(LAYOUT.required_pages(), 3);

        let empty = Layout {
            name: "empty",
            fields: &[],
        };
        assert_eq!(empty.max_page(), None);
        assert_eq!(empty.required_pages(), 0);
    }

    #[test]
    fn test_field_lookup() {
        let spec = LAYOUT.field("consent").expect("consent should exist");
        assert_eq!(spec.page, 1);
        assert_eq!(spec.kind, FieldKind::Check { size: 10.0 });
        assert!(LAYOUT.field("missing").is_none());
    }
}
