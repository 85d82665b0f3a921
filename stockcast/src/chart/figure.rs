//! Serialisable plotly.js figure description

use serde::Serialize;
use std::collections::BTreeMap;

const DARK_BACKGROUND: &str = "#111111";
const DARK_FOREGROUND: &str = "#f2f5fa";
const DARK_GRID: &str = "#283442";

/// A figure: traces plus layout
#[derive(Debug, Clone, Serialize)]
pub struct Figure {
    pub data: Vec<Trace>,
    pub layout: Layout,
}

impl Figure {
    pub fn new(title: &str) -> Self {
        Self {
            data: Vec::new(),
            layout: Layout::new(title),
        }
    }

    /// Add a trace
    pub fn add_trace(&mut self, trace: Trace) -> &mut Self {
        self.data.push(trace);
        self
    }

    /// Figure as a JSON value for embedding in a page
    pub fn to_value(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }
}

/// Line style
#[derive(Debug, Clone, Serialize)]
pub struct Line {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<f64>,
}

/// Marker style
#[derive(Debug, Clone, Serialize)]
pub struct Marker {
    pub color: String,
    pub size: f64,
}

/// One `scatter` trace
#[derive(Debug, Clone, Serialize)]
pub struct Trace {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub name: String,
    pub mode: &'static str,
    pub x: Vec<String>,
    pub y: Vec<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line: Option<Line>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub marker: Option<Marker>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fill: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fillcolor: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub showlegend: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub xaxis: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub yaxis: Option<String>,
}

impl Trace {
    /// Line trace
    pub fn lines(name: &str, x: Vec<String>, y: Vec<f64>) -> Self {
        Self {
            kind: "scatter",
            name: name.to_string(),
            mode: "lines",
            x,
            y,
            line: None,
            marker: None,
            fill: None,
            fillcolor: None,
            showlegend: None,
            xaxis: None,
            yaxis: None,
        }
    }

    /// Point trace
    pub fn markers(name: &str, x: Vec<String>, y: Vec<f64>, color: &str) -> Self {
        Self {
            mode: "markers",
            marker: Some(Marker {
                color: color.to_string(),
                size: 3.0,
            }),
            ..Self::lines(name, x, y)
        }
    }

    pub fn with_line(mut self, color: &str, width: f64) -> Self {
        self.line = Some(Line {
            color: Some(color.to_string()),
            width: Some(width),
        });
        self
    }

    /// Fill the area between this trace and the previous one
    pub fn fill_to_previous(mut self, color: &str) -> Self {
        self.fill = Some("tonexty");
        self.fillcolor = Some(color.to_string());
        self
    }

    pub fn hide_legend(mut self) -> Self {
        self.showlegend = Some(false);
        self
    }

    /// Place the trace on subplot `index` (1-based)
    pub fn on_subplot(mut self, index: usize) -> Self {
        if index > 1 {
            self.xaxis = Some(format!("x{index}"));
            self.yaxis = Some(format!("y{index}"));
        }
        self
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Title {
    pub text: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct RangeSlider {
    pub visible: bool,
}

/// Axis settings
#[derive(Debug, Clone, Default, Serialize)]
pub struct Axis {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<Title>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rangeslider: Option<RangeSlider>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tickformat: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gridcolor: Option<&'static str>,
}

impl Axis {
    pub fn titled(text: &str) -> Self {
        Self {
            title: Some(Title {
                text: text.to_string(),
            }),
            ..Self::default()
        }
    }

    pub fn date(mut self) -> Self {
        self.kind = Some("date");
        self
    }

    pub fn with_rangeslider(mut self) -> Self {
        self.rangeslider = Some(RangeSlider { visible: true });
        self
    }

    pub fn with_tickformat(mut self, format: &str) -> Self {
        self.tickformat = Some(format.to_string());
        self
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Font {
    pub color: &'static str,
}

/// Subplot grid
#[derive(Debug, Clone, Serialize)]
pub struct Grid {
    pub rows: usize,
    pub columns: usize,
    pub pattern: &'static str,
}

/// Figure layout. Axes are keyed `xaxis`, `yaxis2`, ... as plotly expects.
#[derive(Debug, Clone, Serialize)]
pub struct Layout {
    pub title: Title,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub grid: Option<Grid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub paper_bgcolor: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub plot_bgcolor: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font: Option<Font>,
    #[serde(flatten)]
    pub axes: BTreeMap<String, Axis>,
}

impl Layout {
    pub fn new(title: &str) -> Self {
        Self {
            title: Title {
                text: title.to_string(),
            },
            grid: None,
            height: None,
            paper_bgcolor: None,
            plot_bgcolor: None,
            font: None,
            axes: BTreeMap::new(),
        }
    }

    /// Set the x axis of subplot `index` (1-based)
    pub fn set_xaxis(&mut self, index: usize, axis: Axis) -> &mut Self {
        self.axes.insert(axis_key("xaxis", index), axis);
        self
    }

    /// Set the y axis of subplot `index` (1-based)
    pub fn set_yaxis(&mut self, index: usize, axis: Axis) -> &mut Self {
        self.axes.insert(axis_key("yaxis", index), axis);
        self
    }

    /// Dark colours for background, text and grid lines
    pub fn dark(&mut self) -> &mut Self {
        self.paper_bgcolor = Some(DARK_BACKGROUND);
        self.plot_bgcolor = Some(DARK_BACKGROUND);
        self.font = Some(Font {
            color: DARK_FOREGROUND,
        });
        for axis in self.axes.values_mut() {
            axis.gridcolor = Some(DARK_GRID);
        }
        self
    }
}

fn axis_key(prefix: &str, index: usize) -> String {
    if index <= 1 {
        prefix.to_string()
    } else {
        format!("{prefix}{index}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_figure_serialises_plotly_keys() {
        let mut figure = Figure::new("Demo");
        figure.add_trace(Trace::lines("a", vec!["2024-01-01".into()], vec![1.0]).on_subplot(2));
        figure.layout.set_xaxis(1, Axis::titled("ds").with_rangeslider());
        figure.layout.set_yaxis(2, Axis::default());

        let value = figure.to_value();
        assert_eq!(value["data"][0]["type"], "scatter");
        assert_eq!(value["data"][0]["xaxis"], "x2");
        assert_eq!(value["layout"]["title"]["text"], "Demo");
        assert_eq!(value["layout"]["xaxis"]["rangeslider"]["visible"], true);
        assert!(value["layout"].get("yaxis2").is_some());
        assert!(value["data"][0].get("fill").is_none());
    }
}
