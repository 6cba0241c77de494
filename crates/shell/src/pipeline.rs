//! PowerShell pipeline builder.
//!
//! A [`Pipeline`] is a plain value describing one command pipeline. The
//! builder methods consume and return the value, so there is no shared
//! mutable chain state. Stage order in the rendered text is fixed:
//! statements → `Where-Object` → `Sort-Object` → `Select-Object`
//! (→ `-Unique` → `-First`/`-Last`) → `ConvertTo-Json`, because filter,
//! sort and projection are positionally meaningful in PowerShell.

/// One sort key, optionally descending.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortKey {
    pub property: String,
    pub descending: bool,
}

/// An ordered description of a PowerShell pipeline.
#[derive(Debug, Clone, Default)]
pub struct Pipeline {
    statements: Vec<String>,
    filter: Option<String>,
    sort: Vec<SortKey>,
    select: Vec<String>,
    unique: bool,
    first: Option<u32>,
    last: Option<u32>,
    json_depth: Option<u32>,
}

impl Pipeline {
    /// Starts a pipeline with one base statement.
    pub fn new(statement: impl Into<String>) -> Self {
        Self {
            statements: vec![statement.into()],
            ..Self::default()
        }
    }

    /// Appends another base statement, joined with `;`.
    pub fn statement(mut self, statement: impl Into<String>) -> Self {
        self.statements.push(statement.into());
        self
    }

    /// Sets the `Where-Object` predicate. `None` leaves the stage out.
    pub fn filter(mut self, predicate: Option<impl Into<String>>) -> Self {
        self.filter = predicate.map(Into::into);
        self
    }

    /// Adds a `Sort-Object` key.
    pub fn sort(mut self, property: impl Into<String>, descending: bool) -> Self {
        self.sort.push(SortKey {
            property: property.into(),
            descending,
        });
        self
    }

    /// Sets the `Select-Object` projection. Empty slices leave the stage out.
    pub fn select<S: AsRef<str>>(mut self, properties: &[S]) -> Self {
        self.select = properties
            .iter()
            .map(|p| p.as_ref().to_string())
            .filter(|p| !p.is_empty())
            .collect();
        self
    }

    /// Requests `-Unique` on the projection.
    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    /// Keeps only the first `count` results.
    pub fn first(mut self, count: u32) -> Self {
        self.first = Some(count);
        self
    }

    /// Keeps only the last `count` results. Ignored when `first` is set.
    pub fn last(mut self, count: u32) -> Self {
        self.last = Some(count);
        self
    }

    /// Appends a `ConvertTo-Json -Compress -Depth depth` stage.
    pub fn to_json(mut self, depth: u32) -> Self {
        self.json_depth = Some(depth);
        self
    }

    /// Whether a JSON serialization stage is already configured.
    pub fn has_json_stage(&self) -> bool {
        self.json_depth.is_some()
    }

    /// Renders the pipeline to PowerShell command text.
    pub fn render(&self) -> String {
        let mut out = self.statements.join("; ");

        if let Some(filter) = &self.filter {
            out.push_str(&format!(" | Where-Object {{{filter}}}"));
        }

        if !self.sort.is_empty() {
            let keys: Vec<String> = self
                .sort
                .iter()
                .map(|k| {
                    if k.descending {
                        format!("{} -Descending", k.property)
                    } else {
                        k.property.clone()
                    }
                })
                .collect();
            out.push_str(&format!(" | Sort-Object {}", keys.join(", ")));
        }

        if !self.select.is_empty() {
            out.push_str(&format!(" | Select-Object {}", self.select.join(", ")));
        }

        if self.unique {
            out.push_str(" -Unique");
        }

        if let Some(count) = self.first {
            out.push_str(&format!(" -First {count}"));
        } else if let Some(count) = self.last {
            out.push_str(&format!(" -Last {count}"));
        }

        if let Some(depth) = self.json_depth {
            out.push_str(&format!(" | ConvertTo-Json -Compress -Depth {depth}"));
        }

        out
    }
}

/// Quotes a value for interpolation into PowerShell command text.
///
/// Single quotes are doubled and the value is wrapped in single quotes.
/// This is literal quoting only, not an injection boundary; command text
/// built from untrusted settings values is a documented limitation.
pub fn quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}
