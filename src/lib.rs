//! [Matplotlib][] subplots with a uniform cosmetic style.
//!
//! Usage
//! -----
//!
//! [`Subplots`] forwards the grid layout and any additional keyword
//! arguments to `matplotlib.pyplot.subplots`, then styles the result:
//! background color, optional size, no tick marks, black borders of a
//! fixed width and a narrow horizontal gap between panels.  The axes
//! come back in the shape Matplotlib uses for the requested grid
//! (see [`Panels`]).
//!
//! ```
//! use styled_subplots::Subplots;
//! let (fig, panels) = Subplots::grid(2, 2).build()?;
//! assert_eq!(panels.len(), 4);
//! fig.save().to_file("target/doc_grid.png")?;
//! # Ok::<(), styled_subplots::Error>(())
//! ```
//!
//! [Matplotlib]: https://matplotlib.org/

use std::path::Path;
use lazy_static::lazy_static;
use ndarray::{Array1, Array2};
use numpy::{prelude::*, PyArray1, PyArray2};
use pyo3::{
    prelude::*,
    intern,
    exceptions::{PyFileNotFoundError, PyIndexError, PyPermissionError},
    types::{IntoPyDict, PyDict},
};
use tracing::{debug, trace};

#[cfg(doctest)]
doc_comment::doctest!("../README.md");

macro_rules! getattr {
    ($py: ident, $obj: expr, $f: literal) => {
        $obj.getattr($py, intern!($py, $f))
    };
}

macro_rules! meth {
    ($obj: expr, $m: ident, $py: ident -> $args: expr) => {
        Python::with_gil(|py| {
            let $py = py;
            $obj.call_method1(py, intern!(py, stringify!($m)), $args)
        })
    };
    ($obj: expr, $m: ident, $args: expr) => {
        Python::with_gil(|py| {
            $obj.call_method1(py, intern!(py, stringify!($m)), $args)
        })
    };
}

/// Possible errors of the styled subplot functions.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The Python library "matplotlib" was not found.
    #[error("The matplotlib library has not been found.\n\
             Please install it.  See https://matplotlib.org/\n\
             If you use Anaconda, see https://github.com/PyO3/pyo3/issues/1554")]
    NoMatplotlib,
    /// The path contains an element that is not a directory or does
    /// not exist.
    #[error("A path contains an element that is not a directory or \
             does not exist")]
    FileNotFoundError,
    /// Permission denied to access or create the filesystem path.
    #[error("Permission denied to access or create the filesystem path")]
    PermissionError,
    /// Errors raised by Matplotlib itself (invalid grid, color,
    /// keyword argument,...).
    #[error("Python error: {0}")]
    Python(#[from] PyErr),
    /// The axes returned by Matplotlib do not fit the grid they were
    /// reported with.
    #[error("Axes do not fit their grid: {0}")]
    Shape(#[from] ndarray::ShapeError),
}

/// Import and return a handle to the module `$m`.
macro_rules! pyimport { ($m: literal) => {
    Python::with_gil(|py|
        PyModule::import_bound(py, $m).map(|m| m.unbind()))
}}

lazy_static! {
    static ref PYPLOT: Result<Py<PyModule>, PyErr> = {
        pyimport!("matplotlib.pyplot")
    };
    static ref COLORS: Result<Py<PyModule>, PyErr> = {
        pyimport!("matplotlib.colors")
    };
}

/// Return a handle to the module `$m`.
/// ⚠ This may try to lock Python's GIL.  Make sure it is executed
/// outside a call to `Python::with_gil`.
macro_rules! pymod { ($m: ident) => {
    $m.as_ref().map_err(|_| Error::NoMatplotlib)
}}


/// A color as understood by Matplotlib.
#[derive(Debug, Clone, PartialEq)]
pub enum Color {
    /// Red, green, blue and alpha components in \[0, 1\].
    Rgba([f64; 4]),
    /// Any color specification accepted by Matplotlib, e.g. `"black"`,
    /// `"C1"` or `"#FFFFFFFF"`.
    Spec(String),
}

impl Color {
    pub const WHITE: Color = Color::Rgba([1., 1., 1., 1.]);
    pub const BLACK: Color = Color::Rgba([0., 0., 0., 1.]);

    /// Resolve the color to its RGBA components using Matplotlib.
    pub fn to_rgba(&self) -> Result<[f64; 4], Error> {
        let colors = pymod!(COLORS)?;
        Python::with_gil(|py| {
            let rgba = colors.bind(py)
                .call_method1(intern!(py, "to_rgba"), (self.to_object(py),))?;
            Ok(rgba.extract()?)
        })
    }
}

impl Default for Color {
    fn default() -> Self { Color::WHITE }
}

impl From<[f64; 4]> for Color {
    fn from(rgba: [f64; 4]) -> Self { Color::Rgba(rgba) }
}

impl From<&str> for Color {
    fn from(s: &str) -> Self { Color::Spec(s.to_string()) }
}

impl From<String> for Color {
    fn from(s: String) -> Self { Color::Spec(s) }
}

impl ToPyObject for Color {
    fn to_object(&self, py: Python<'_>) -> PyObject {
        match self {
            Color::Rgba([r, g, b, a]) => (*r, *g, *b, *a).to_object(py),
            Color::Spec(s) => s.to_object(py),
        }
    }
}

/// A keyword argument passed unchanged to `pyplot.subplots`.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    /// Becomes a Python list, e.g. for `width_ratios`.
    List(Vec<Value>),
    /// Becomes a Python dict, e.g. for `gridspec_kw` or `subplot_kw`.
    Dict(Vec<(String, Value)>),
}

impl Value {
    /// Build a [`Value::Dict`] from `(name, value)` pairs.
    ///
    /// # Example
    ///
    /// ```
    /// use styled_subplots::{Subplots, Value};
    /// let (_fig, panels) = Subplots::grid(1, 2)
    ///     .kw("gridspec_kw", Value::dict([("hspace", 0.)]))
    ///     .build()?;
    /// assert_eq!(panels.len(), 2);
    /// # Ok::<(), styled_subplots::Error>(())
    /// ```
    pub fn dict<K, V>(entries: impl IntoIterator<Item = (K, V)>) -> Value
    where K: Into<String>, V: Into<Value> {
        Value::Dict(entries.into_iter()
                    .map(|(k, v)| (k.into(), v.into()))
                    .collect())
    }

    fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(i) => Some(*i as f64),
            Value::Float(x) => Some(*x),
            _ => None,
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self { Value::Bool(b) }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self { Value::Int(i.into()) }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self { Value::Int(i) }
}

impl From<f64> for Value {
    fn from(x: f64) -> Self { Value::Float(x) }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self { Value::Str(s.to_string()) }
}

impl From<String> for Value {
    fn from(s: String) -> Self { Value::Str(s) }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(v: Vec<T>) -> Self {
        Value::List(v.into_iter().map(Into::into).collect())
    }
}

impl ToPyObject for Value {
    fn to_object(&self, py: Python<'_>) -> PyObject {
        match self {
            Value::Bool(b) => b.to_object(py),
            Value::Int(i) => i.to_object(py),
            Value::Float(x) => x.to_object(py),
            Value::Str(s) => s.to_object(py),
            Value::List(items) => items.to_object(py),
            Value::Dict(entries) => entries.iter()
                .map(|(k, v)| (k, v))
                .into_py_dict_bound(py)
                .into_any()
                .unbind(),
        }
    }
}


/// The top level container for all the plot elements.
#[derive(Debug)]
pub struct Figure {
    fig: PyObject, // instance of matplotlib.figure.Figure
}

/// A single plotting area of a [`Figure`].
#[derive(Debug, Clone)]
pub struct Axes {
    ax: PyObject,
}

/// One of the border lines of an [`Axes`].
#[derive(Debug, Clone)]
pub struct Spine {
    name: String,
    spine: PyObject,
}

#[inline(always)]
fn grid<const R: usize, const C: usize, U>(
    f: impl Fn(usize, usize) -> U) -> [[U; C]; R] {
    let mut r = 0;
    [(); R].map(|_| {
        let mut c = 0;
        let row = [(); C].map(|_| {
            let y = f(r, c);
            c += 1;
            y });
        r += 1;
        row })
}

impl Figure {
    /// Set the figure size in inches.
    pub fn set_size_inches(&mut self, w: f64, h: f64)
                           -> Result<&mut Self, Error> {
        meth!(self.fig, set_size_inches, ((w, h),))?;
        Ok(self)
    }

    /// Return the figure (width, height) in inches.
    pub fn size_inches(&self) -> Result<(f64, f64), Error> {
        Python::with_gil(|py| {
            let [w, h]: [f64; 2] = self.fig
                .call_method0(py, intern!(py, "get_size_inches"))?
                .call_method0(py, intern!(py, "tolist"))?
                .extract(py)?;
            Ok((w, h))
        })
    }

    /// Set the background color of the figure.
    pub fn set_facecolor(&mut self, color: &Color)
                         -> Result<&mut Self, Error> {
        Python::with_gil(|py| {
            getattr!(py, self.fig, "patch")?
                .call_method1(py, intern!(py, "set_facecolor"),
                              (color.to_object(py),))
        })?;
        Ok(self)
    }

    /// Return the RGBA background color of the figure.
    pub fn facecolor(&self) -> Result<[f64; 4], Error> {
        Python::with_gil(|py| {
            Ok(self.fig.call_method0(py, intern!(py, "get_facecolor"))?
               .extract(py)?)
        })
    }

    /// Set the horizontal space between subplots, as a fraction of
    /// the average axes width.
    pub fn subplots_adjust_wspace(&mut self, wspace: f64)
                                  -> Result<&mut Self, Error> {
        Python::with_gil(|py| {
            let kwargs = PyDict::new_bound(py);
            kwargs.set_item("wspace", wspace)?;
            self.fig.bind(py).call_method(
                intern!(py, "subplots_adjust"), (), Some(&kwargs))?;
            Ok::<(), Error>(())
        })?;
        Ok(self)
    }

    /// Return the horizontal space between subplots.
    pub fn wspace(&self) -> Result<f64, Error> {
        Python::with_gil(|py| {
            Ok(getattr!(py, self.fig, "subplotpars")?
               .getattr(py, intern!(py, "wspace"))?
               .extract(py)?)
        })
    }

    pub fn save(&self) -> Savefig {
        Savefig { fig: self.fig.clone(), dpi: None }
    }

    /// Remove the figure from pyplot's list of open figures.
    pub fn close(self) -> Result<(), Error> {
        let pyplot = pymod!(PYPLOT)?;
        Python::with_gil(|py| {
            pyplot.bind(py).call_method1(intern!(py, "close"), (self.fig.clone_ref(py),))
                .map(|_| ())
        })?;
        Ok(())
    }
}

pub struct Savefig {
    fig: PyObject,
    dpi: Option<f64>,
}

impl Savefig {
    pub fn dpi(&mut self, dpi: f64) -> &mut Self {
        if dpi > 0. {
            self.dpi = Some(dpi);
        } else {
            self.dpi = None;
        }
        self
    }

    pub fn to_file(&self, path: impl AsRef<Path>) -> Result<(), Error> {
        Python::with_gil(|py| {
            let kwargs = PyDict::new_bound(py);
            if let Some(dpi) = self.dpi {
                kwargs.set_item("dpi", dpi)?;
            }
            self.fig.bind(py).call_method(
                intern!(py, "savefig"), (path.as_ref(),), Some(&kwargs)
            ).map_err(|e| {
                if e.is_instance_of::<PyFileNotFoundError>(py) {
                    Error::FileNotFoundError
                } else if e.is_instance_of::<PyPermissionError>(py) {
                    Error::PermissionError
                } else {
                    Error::Python(e)
                }
            })?;
            Ok(())
        })
    }
}


impl Axes {
    /// Set the positions of the x-axis ticks.  An empty slice hides them.
    pub fn set_xticks(&mut self, ticks: &[f64]) -> Result<&mut Self, Error> {
        meth!(self.ax, set_xticks, (ticks.to_vec(),))?;
        Ok(self)
    }

    /// Set the positions of the y-axis ticks.  An empty slice hides them.
    pub fn set_yticks(&mut self, ticks: &[f64]) -> Result<&mut Self, Error> {
        meth!(self.ax, set_yticks, (ticks.to_vec(),))?;
        Ok(self)
    }

    pub fn xticks(&self) -> Result<Vec<f64>, Error> {
        self.ticks("get_xticks")
    }

    pub fn yticks(&self) -> Result<Vec<f64>, Error> {
        self.ticks("get_yticks")
    }

    fn ticks(&self, getter: &str) -> Result<Vec<f64>, Error> {
        Python::with_gil(|py| {
            Ok(self.ax.call_method0(py, getter)?
               .call_method0(py, intern!(py, "tolist"))?
               .extract(py)?)
        })
    }

    /// Return the position of the axes in figure coordinates as
    /// `[x0, y0, width, height]`.
    pub fn position(&self) -> Result<[f64; 4], Error> {
        Python::with_gil(|py| {
            Ok(self.ax.call_method0(py, intern!(py, "get_position"))?
               .getattr(py, intern!(py, "bounds"))?
               .extract(py)?)
        })
    }

    /// Return the border lines of the axes.
    pub fn spines(&self) -> Result<Vec<Spine>, Error> {
        Python::with_gil(|py| {
            let items = getattr!(py, self.ax, "spines")?
                .call_method0(py, intern!(py, "items"))?;
            let mut spines = vec![];
            for item in items.bind(py).iter()? {
                let (name, spine): (String, PyObject) = item?.extract()?;
                spines.push(Spine { name, spine });
            }
            Ok(spines)
        })
    }

    pub fn set_title(&mut self, v: &str) -> Result<&mut Self, Error> {
        meth!(self.ax, set_title, (v,))?;
        Ok(self)
    }
}

impl Spine {
    /// Position of the spine: "left", "right", "bottom" or "top".
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_edgecolor(&mut self, color: &Color)
                         -> Result<&mut Self, Error> {
        meth!(self.spine, set_edgecolor, py -> (color.to_object(py),))?;
        Ok(self)
    }

    /// Return the RGBA color of the spine.
    pub fn edgecolor(&self) -> Result<[f64; 4], Error> {
        Python::with_gil(|py| {
            Ok(self.spine.call_method0(py, intern!(py, "get_edgecolor"))?
               .extract(py)?)
        })
    }

    pub fn set_linewidth(&mut self, w: f64) -> Result<&mut Self, Error> {
        meth!(self.spine, set_linewidth, (w,))?;
        Ok(self)
    }

    pub fn linewidth(&self) -> Result<f64, Error> {
        Python::with_gil(|py| {
            Ok(self.spine.call_method0(py, intern!(py, "get_linewidth"))?
               .extract(py)?)
        })
    }
}


/// The axes of a figure, in the shape `pyplot.subplots` returns them.
#[derive(Debug, Clone)]
pub enum Panels {
    /// Exactly one plotting area.
    One(Axes),
    /// A single row or column of plotting areas.
    Line(Array1<Axes>),
    /// Rows × columns of plotting areas.
    Grid(Array2<Axes>),
}

impl Panels {
    /// Number of plotting areas.
    pub fn len(&self) -> usize {
        match self {
            Panels::One(_) => 1,
            Panels::Line(a) => a.len(),
            Panels::Grid(a) => a.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Iterate over the plotting areas in row-major order.
    pub fn iter(&self) -> Box<dyn Iterator<Item = &Axes> + '_> {
        match self {
            Panels::One(ax) => Box::new(std::iter::once(ax)),
            Panels::Line(a) => Box::new(a.iter()),
            Panels::Grid(a) => Box::new(a.iter()),
        }
    }

    pub fn iter_mut(&mut self) -> Box<dyn Iterator<Item = &mut Axes> + '_> {
        match self {
            Panels::One(ax) => Box::new(std::iter::once(ax)),
            Panels::Line(a) => Box::new(a.iter_mut()),
            Panels::Grid(a) => Box::new(a.iter_mut()),
        }
    }

    /// Return the plotting areas in row-major order.
    pub fn into_vec(self) -> Vec<Axes> {
        match self {
            Panels::One(ax) => vec![ax],
            Panels::Line(a) => a.into_raw_vec(),
            Panels::Grid(a) => a.into_raw_vec(),
        }
    }

    /// Return the plotting area if there is exactly one.
    pub fn into_one(self) -> Option<Axes> {
        match self {
            Panels::One(ax) => Some(ax),
            _ => None,
        }
    }

    /// Return the plotting areas as an `R`×`C` array (row-major), or
    /// `None` if their number is not `R * C`.
    ///
    /// # Example
    ///
    /// ```
    /// use styled_subplots as plt;
    /// let (_fig, panels) = plt::styled_subplots(1, 2)?;
    /// let [[mut left, mut right]] = panels.into_array().unwrap();
    /// left.set_title("left")?;
    /// right.set_title("right")?;
    /// # Ok::<(), styled_subplots::Error>(())
    /// ```
    pub fn into_array<const R: usize, const C: usize>(
        self) -> Option<[[Axes; C]; R]> {
        let axes = self.into_vec();
        if axes.len() != R * C {
            return None;
        }
        Some(grid(|r, c| axes[r * C + c].clone()))
    }
}

/// Shape of the axes as returned by `pyplot.subplots`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Layout {
    /// A bare `Axes` object.
    Scalar,
    Line(usize),
    Grid(usize, usize),
}

fn element(ax: Option<PyObject>) -> PyResult<PyObject> {
    ax.ok_or_else(|| PyIndexError::new_err("axes array shorter than its shape"))
}

/// Flatten the axes returned by `pyplot.subplots` into a row-major
/// sequence, remembering their layout.
fn normalize(axs: &Bound<'_, PyAny>) -> PyResult<(Vec<Axes>, Layout)> {
    if let Ok(arr) = axs.downcast::<PyArray2<PyObject>>() {
        let (rows, cols) = (arr.shape()[0], arr.shape()[1]);
        let mut axes = Vec::with_capacity(rows * cols);
        for r in 0 .. rows {
            for c in 0 .. cols {
                axes.push(Axes { ax: element(arr.get_owned([r, c]))? });
            }
        }
        Ok((axes, Layout::Grid(rows, cols)))
    } else if let Ok(arr) = axs.downcast::<PyArray1<PyObject>>() {
        let n = arr.len();
        let mut axes = Vec::with_capacity(n);
        for i in 0 .. n {
            axes.push(Axes { ax: element(arr.get_owned(i))? });
        }
        Ok((axes, Layout::Line(n)))
    } else {
        Ok((vec![Axes { ax: axs.clone().unbind() }], Layout::Scalar))
    }
}

/// Inverse of [`normalize`], except that a single plotting area is
/// always returned bare.
fn denormalize(mut axes: Vec<Axes>, layout: Layout) -> Result<Panels, Error> {
    if axes.len() == 1 {
        return Ok(Panels::One(axes.remove(0)));
    }
    match layout {
        Layout::Scalar | Layout::Line(_) =>
            Ok(Panels::Line(Array1::from_vec(axes))),
        Layout::Grid(r, c) =>
            Ok(Panels::Grid(Array2::from_shape_vec((r, c), axes)?)),
    }
}


/// Cosmetic settings applied to every plotting area.
#[derive(Debug, Clone, PartialEq)]
pub struct Style {
    /// Color of all spines.
    pub border_color: Color,
    /// Line width of all spines, in points.
    pub border_width: f64,
    /// Horizontal space between subplots, as a fraction of the
    /// average axes width.
    pub wspace: f64,
}

impl Default for Style {
    fn default() -> Self {
        Style { border_color: Color::BLACK,
                border_width: 1.,
                wspace: 0.05 }
    }
}

impl Style {
    /// Hide the ticks and restyle the borders of every plotting area
    /// in `panels`, then set the horizontal spacing of `fig`.
    /// Applying it more than once has no further effect.
    pub fn apply(&self, fig: &mut Figure, panels: &mut Panels)
                 -> Result<(), Error> {
        self.apply_all(fig, panels.iter_mut())
    }

    fn apply_all<'a>(&self, fig: &mut Figure,
                     axes: impl IntoIterator<Item = &'a mut Axes>)
                     -> Result<(), Error> {
        for ax in axes {
            self.apply_axes(ax)?;
        }
        fig.subplots_adjust_wspace(self.wspace)?;
        Ok(())
    }

    fn apply_axes(&self, ax: &mut Axes) -> Result<(), Error> {
        ax.set_xticks(&[])?.set_yticks(&[])?;
        for mut spine in ax.spines()? {
            trace!(spine = spine.name(), "styling spine");
            spine.set_edgecolor(&self.border_color)?
                .set_linewidth(self.border_width)?;
        }
        Ok(())
    }
}


/// Options to create styled subplots.
///
/// # Example
///
/// ```
/// use styled_subplots::{Color, Subplots};
/// let (fig, panels) = Subplots::grid(1, 3)
///     .size(9., 3.)
///     .facecolor("#EEEEEE")
///     .kw("sharey", true)
///     .build()?;
/// assert_eq!(fig.facecolor()?, Color::from("#EEEEEE").to_rgba()?);
/// assert_eq!(panels.len(), 3);
/// # Ok::<(), styled_subplots::Error>(())
/// ```
#[derive(Debug, Clone)]
pub struct Subplots {
    nrows: usize,
    ncols: usize,
    facecolor: Color,
    size: Option<(f64, f64)>,
    kwargs: Vec<(String, Value)>,
    style: Style,
}

impl Default for Subplots {
    fn default() -> Self { Self::grid(1, 1) }
}

impl Subplots {
    /// Options for a grid of `nrows` × `ncols` subplots.
    pub fn grid(nrows: usize, ncols: usize) -> Self {
        Subplots { nrows, ncols,
                   facecolor: Color::WHITE,
                   size: None,
                   kwargs: vec![],
                   style: Style::default() }
    }

    /// Background color of the figure (default: opaque white).
    pub fn facecolor(&mut self, color: impl Into<Color>) -> &mut Self {
        self.facecolor = color.into();
        self
    }

    /// Size of the figure in inches.
    pub fn size(&mut self, w: f64, h: f64) -> &mut Self {
        self.size = Some((w, h));
        self
    }

    /// Pass the keyword argument `name=value` to `pyplot.subplots`.
    ///
    /// `facecolor` (a color string or 3/4 numbers) and `figsize` (two
    /// numbers) are taken as [`Subplots::facecolor`] and
    /// [`Subplots::size`] instead, since those are applied after the
    /// figure is created.  Other forms of these two keywords are
    /// forwarded and then overridden by the styling.
    pub fn kw(&mut self, name: impl Into<String>, value: impl Into<Value>)
              -> &mut Self {
        let (name, value) = (name.into(), value.into());
        match (name.as_str(), &value) {
            ("facecolor", Value::Str(c)) => {
                self.facecolor = Color::Spec(c.clone());
                return self;
            }
            ("facecolor", Value::List(rgba)) => {
                let c: Option<Vec<f64>> = rgba.iter().map(Value::as_f64).collect();
                match c.as_deref() {
                    Some(&[r, g, b]) => return self.facecolor([r, g, b, 1.]),
                    Some(&[r, g, b, a]) => return self.facecolor([r, g, b, a]),
                    _ => {}
                }
            }
            ("figsize", Value::List(wh)) => {
                if let [w, h] = wh.as_slice() {
                    if let (Some(w), Some(h)) = (w.as_f64(), h.as_f64()) {
                        return self.size(w, h);
                    }
                }
            }
            _ => {}
        }
        self.kwargs.push((name, value));
        self
    }

    pub fn style(&mut self, style: Style) -> &mut Self {
        self.style = style;
        self
    }

    fn kwargs<'py>(&self, py: Python<'py>) -> PyResult<Bound<'py, PyDict>> {
        let kwargs = PyDict::new_bound(py);
        for (name, value) in &self.kwargs {
            kwargs.set_item(name, value.to_object(py))?;
        }
        Ok(kwargs)
    }

    /// Create the figure and its axes, then style them.
    ///
    /// Return an error if Matplotlib is not present on the system or
    /// rejects the options.
    pub fn build(&self) -> Result<(Figure, Panels), Error> {
        debug!(nrows = self.nrows, ncols = self.ncols,
               kwargs = self.kwargs.len(), "creating styled subplots");
        let pyplot = pymod!(PYPLOT)?;
        let (mut fig, mut axes, layout) = Python::with_gil(|py| {
            let ret = pyplot.bind(py).call_method(
                intern!(py, "subplots"), (self.nrows, self.ncols),
                Some(&self.kwargs(py)?))?;
            let (fig, axs): (PyObject, PyObject) = ret.extract()?;
            let (axes, layout) = normalize(axs.bind(py))?;
            Ok::<_, Error>((Figure { fig }, axes, layout))
        })?;
        if let Some((w, h)) = self.size {
            fig.set_size_inches(w, h)?;
        }
        self.style.apply_all(&mut fig, axes.iter_mut())?;
        fig.set_facecolor(&self.facecolor)?;
        debug!(?layout, panels = axes.len(), "styled subplots ready");
        Ok((fig, denormalize(axes, layout)?))
    }
}

/// Create a figure with `nrows` × `ncols` styled subplots using the
/// default options.
///
/// # Example
///
/// ```
/// use styled_subplots as plt;
/// let (fig, panels) = plt::styled_subplots(1, 1)?;
/// assert!(matches!(panels, plt::Panels::One(_)));
/// assert_eq!(fig.facecolor()?, [1., 1., 1., 1.]);
/// # Ok::<(), styled_subplots::Error>(())
/// ```
pub fn styled_subplots(nrows: usize, ncols: usize)
                       -> Result<(Figure, Panels), Error> {
    Subplots::grid(nrows, ncols).build()
}



#[cfg(test)]
mod tests {
    use super::*;

    fn assert_styled(ax: &Axes) -> Result<(), Error> {
        assert!(ax.xticks()?.is_empty());
        assert!(ax.yticks()?.is_empty());
        let spines = ax.spines()?;
        assert_eq!(spines.len(), 4);
        for spine in &spines {
            assert_eq!(spine.edgecolor()?, [0., 0., 0., 1.], "{}", spine.name());
            assert_eq!(spine.linewidth()?, 1.);
        }
        Ok(())
    }

    fn dummy_axes(n: usize) -> Vec<Axes> {
        Python::with_gil(|py| (0 .. n).map(|_| Axes { ax: py.None() }).collect())
    }

    #[test]
    fn single_panel_is_bare() -> Result<(), Error> {
        let (fig, panels) = styled_subplots(1, 1)?;
        let ax = panels.into_one().expect("1×1 grid gives a single axes");
        assert_styled(&ax)?;
        assert_eq!(fig.facecolor()?, [1., 1., 1., 1.]);
        fig.save().to_file("target/single_panel.pdf")?;
        Ok(())
    }

    #[test]
    fn unsqueezed_single_panel_is_bare() -> Result<(), Error> {
        let (_fig, panels) = Subplots::grid(1, 1).kw("squeeze", false).build()?;
        assert!(matches!(panels, Panels::One(_)));
        Ok(())
    }

    #[test]
    fn unsqueezed_row_stays_two_dimensional() -> Result<(), Error> {
        let (fig, panels) = Subplots::grid(1, 3).kw("squeeze", false).build()?;
        match &panels {
            Panels::Grid(axes) => assert_eq!(axes.dim(), (1, 3)),
            p => panic!("expected a grid of axes, got {:?}", p),
        }
        for ax in panels.iter() {
            assert_styled(ax)?;
        }
        fig.close()
    }

    #[test]
    fn width_ratios_reach_subplots() -> Result<(), Error> {
        let (fig, panels) = Subplots::grid(1, 2)
            .kw("width_ratios", vec![1., 2.])
            .kw("gridspec_kw", Value::dict([("hspace", 0.)]))
            .build()?;
        let [[left, right]] = panels.into_array().expect("1×2 grid");
        let [_, _, wl, _] = left.position()?;
        let [_, _, wr, _] = right.position()?;
        assert!((wr / wl - 2.).abs() < 1e-9, "widths {} and {}", wl, wr);
        fig.close()
    }

    #[test]
    fn unknown_keyword_is_a_python_error() {
        let r = Subplots::grid(1, 2).kw("bogus", 1).build();
        assert!(matches!(r, Err(Error::Python(_))));
    }

    #[test]
    fn facecolor_and_figsize_keywords_are_styling_options() -> Result<(), Error> {
        let mut opts = Subplots::grid(1, 2);
        opts.kw("facecolor", "red").kw("figsize", vec![4., 2.]);
        assert_eq!(opts.facecolor, Color::from("red"));
        assert_eq!(opts.size, Some((4., 2.)));
        assert!(opts.kwargs.is_empty());
        let (fig, _) = opts.build()?;
        assert_eq!(fig.facecolor()?, [1., 0., 0., 1.]);
        assert_eq!(fig.size_inches()?, (4., 2.));
        opts.kw("facecolor", vec![0.5, 0.5, 0.5]);
        assert_eq!(opts.facecolor, Color::Rgba([0.5, 0.5, 0.5, 1.]));
        fig.close()
    }

    #[test]
    fn close_forgets_the_figure() -> Result<(), Error> {
        let (fig, _) = styled_subplots(1, 1)?;
        let num: i64 = Python::with_gil(|py| {
            getattr!(py, fig.fig, "number")?.extract(py)
        })?;
        fig.close()?;
        let pyplot = pymod!(PYPLOT)?;
        let open: bool = Python::with_gil(|py| {
            pyplot.bind(py).call_method1(intern!(py, "fignum_exists"), (num,))?
                .extract()
        })?;
        assert!(!open);
        Ok(())
    }

    #[test]
    fn row_of_three() -> Result<(), Error> {
        let (fig, panels) = Subplots::grid(1, 3).size(9., 3.).build()?;
        assert_eq!(fig.size_inches()?, (9., 3.));
        assert_eq!(fig.facecolor()?, [1., 1., 1., 1.]);
        assert_eq!(fig.wspace()?, 0.05);
        match &panels {
            Panels::Line(axes) => assert_eq!(axes.len(), 3),
            p => panic!("expected a line of axes, got {:?}", p),
        }
        for ax in panels.iter() {
            assert_styled(ax)?;
        }
        fig.save().to_file("target/row_of_three.pdf")?;
        Ok(())
    }

    #[test]
    fn column_of_two() -> Result<(), Error> {
        let (_fig, panels) = styled_subplots(2, 1)?;
        let [[top], [bottom]] = panels.into_array().expect("2×1 grid");
        assert_styled(&top)?;
        assert_styled(&bottom)?;
        Ok(())
    }

    #[test]
    fn grid_keeps_its_shape() -> Result<(), Error> {
        let (fig, panels) = Subplots::grid(2, 3).kw("sharex", true).build()?;
        match &panels {
            Panels::Grid(axes) => assert_eq!(axes.dim(), (2, 3)),
            p => panic!("expected a grid of axes, got {:?}", p),
        }
        for ax in panels.iter() {
            assert_styled(ax)?;
        }
        fig.save().dpi(50.).to_file("target/grid_2x3.png")?;
        Ok(())
    }

    #[test]
    fn explicit_facecolor() -> Result<(), Error> {
        let rgba = [0.2, 0.4, 0.6, 1.];
        let (fig, _) = Subplots::grid(1, 2).facecolor(rgba).build()?;
        assert_eq!(fig.facecolor()?, rgba);
        let (fig, _) = Subplots::grid(1, 2).facecolor("tab:orange").build()?;
        assert_eq!(fig.facecolor()?, Color::from("tab:orange").to_rgba()?);
        Ok(())
    }

    #[test]
    fn default_facecolor_is_opaque_white() -> Result<(), Error> {
        assert_eq!(Color::from("#FFFFFFFF").to_rgba()?, [1., 1., 1., 1.]);
        assert_eq!(Subplots::default().facecolor, Color::WHITE);
        Ok(())
    }

    #[test]
    fn invalid_color_is_a_python_error() {
        let r = Subplots::grid(1, 1).facecolor("not a colour").build();
        assert!(matches!(r, Err(Error::Python(_))));
    }

    #[test]
    fn restyling_changes_nothing() -> Result<(), Error> {
        let (mut fig, mut panels) = Subplots::grid(1, 2).size(6., 3.).build()?;
        let style = Style::default();
        style.apply(&mut fig, &mut panels)?;
        fig.set_facecolor(&Color::WHITE)?;
        assert_eq!(fig.size_inches()?, (6., 3.));
        assert_eq!(fig.facecolor()?, [1., 1., 1., 1.]);
        assert_eq!(fig.wspace()?, 0.05);
        for ax in panels.iter() {
            assert_styled(ax)?;
        }
        Ok(())
    }

    #[test]
    fn custom_style() -> Result<(), Error> {
        let style = Style { border_color: "red".into(),
                            border_width: 2.5,
                            wspace: 0.3 };
        let (fig, panels) = Subplots::grid(1, 2).style(style).build()?;
        assert_eq!(fig.wspace()?, 0.3);
        for ax in panels.iter() {
            for spine in ax.spines()? {
                assert_eq!(spine.edgecolor()?, [1., 0., 0., 1.]);
                assert_eq!(spine.linewidth()?, 2.5);
            }
        }
        Ok(())
    }

    #[test]
    fn denormalize_layouts() -> Result<(), Error> {
        assert!(matches!(denormalize(dummy_axes(1), Layout::Scalar)?,
                         Panels::One(_)));
        assert!(matches!(denormalize(dummy_axes(1), Layout::Grid(1, 1))?,
                         Panels::One(_)));
        match denormalize(dummy_axes(4), Layout::Line(4))? {
            Panels::Line(a) => assert_eq!(a.len(), 4),
            p => panic!("expected a line, got {:?}", p),
        }
        match denormalize(dummy_axes(6), Layout::Grid(3, 2))? {
            Panels::Grid(a) => assert_eq!(a.dim(), (3, 2)),
            p => panic!("expected a grid, got {:?}", p),
        }
        assert!(matches!(denormalize(dummy_axes(5), Layout::Grid(3, 2)),
                         Err(Error::Shape(_))));
        Ok(())
    }

    #[test]
    fn into_array_checks_the_count() {
        let panels = Panels::Line(Array1::from_vec(dummy_axes(3)));
        assert!(panels.clone().into_array::<2, 2>().is_none());
        assert!(panels.into_array::<1, 3>().is_some());
    }
}
