use std::collections::{BTreeMap, HashMap};
use std::panic::{self, AssertUnwindSafe};
use std::path::PathBuf;
use std::sync::{Arc, Mutex, OnceLock, PoisonError};

use pyo3::exceptions::PyValueError;
use pyo3::prelude::*;
use pyo3::types::{PyDict, PyList};
use skintone_core::recommend::{recommend_or_template, Outfit, Recommendation, TemplateRecommender};
use skintone_core::result::messages;
use skintone_core::{
    AnalyzerConfig, DetectionResult, Presentation, SkinTone, SkinToneAnalyzer, SkinToneError,
    FALLBACK_RGB, FALLBACK_TONE,
};

fn to_py_err(e: SkinToneError) -> PyErr {
    PyValueError::new_err(e.to_string())
}

fn result_to_dict<'py>(py: Python<'py>, result: &DetectionResult) -> PyResult<Bound<'py, PyDict>> {
    let dict = PyDict::new(py);
    dict.set_item("skin_tone", result.tone.as_str())?;
    dict.set_item("rgb", PyList::new(py, result.rgb_values())?)?;
    dict.set_item("r", result.r)?;
    dict.set_item("g", result.g)?;
    dict.set_item("b", result.b)?;
    dict.set_item("face_detected", result.face_detected)?;
    dict.set_item("message", &result.message)?;
    Ok(dict)
}

fn outfit_to_dict<'py>(py: Python<'py>, outfit: &Outfit) -> PyResult<Bound<'py, PyDict>> {
    let dict = PyDict::new(py);
    dict.set_item("tops", &outfit.tops)?;
    dict.set_item("bottoms", &outfit.bottoms)?;
    dict.set_item("shoes", &outfit.shoes)?;
    Ok(dict)
}

fn recommendation_to_dict<'py>(
    py: Python<'py>,
    rec: &Recommendation,
) -> PyResult<Bound<'py, PyDict>> {
    let dress_codes = PyDict::new(py);
    dress_codes.set_item("formal", outfit_to_dict(py, &rec.dress_codes.formal)?)?;
    dress_codes.set_item("business", outfit_to_dict(py, &rec.dress_codes.business)?)?;
    dress_codes.set_item("casual", outfit_to_dict(py, &rec.dress_codes.casual)?)?;
    dress_codes.set_item("party", outfit_to_dict(py, &rec.dress_codes.party)?)?;

    let hairstyle = PyDict::new(py);
    hairstyle.set_item("suggestion", &rec.hairstyle.suggestion)?;
    hairstyle.set_item("maintenance_tips", &rec.hairstyle.maintenance_tips)?;

    let accessories = PyDict::new(py);
    accessories.set_item("earrings", &rec.accessories.earrings)?;
    accessories.set_item("necklaces", &rec.accessories.necklaces)?;
    accessories.set_item("bracelets", &rec.accessories.bracelets)?;
    accessories.set_item("watches", &rec.accessories.watches)?;

    let palette = PyDict::new(py);
    palette.set_item("primary", &rec.color_palette.primary)?;
    palette.set_item("secondary", &rec.color_palette.secondary)?;
    palette.set_item("accent", &rec.color_palette.accent)?;

    let links: BTreeMap<&str, &str> = rec
        .shopping_links
        .iter()
        .map(|(k, v)| (k.as_str(), v.as_str()))
        .collect();

    let dict = PyDict::new(py);
    dict.set_item("dress_codes", dress_codes)?;
    dict.set_item("hairstyle", hairstyle)?;
    dict.set_item("accessories", accessories)?;
    dict.set_item("color_palette", palette)?;
    dict.set_item("reasoning", &rec.reasoning)?;
    dict.set_item("shopping_links", links)?;
    Ok(dict)
}

fn build_config(
    margin_ratio: Option<f64>,
    model_path: Option<PathBuf>,
    config_path: Option<PathBuf>,
) -> Result<AnalyzerConfig, SkinToneError> {
    let mut config = match config_path {
        Some(path) => AnalyzerConfig::from_file(&path)?,
        None => AnalyzerConfig::default(),
    };
    if let Some(ratio) = margin_ratio {
        config.margin_ratio = ratio;
    }
    if model_path.is_some() {
        config.model_path = model_path;
    }
    Ok(config)
}

fn run_analysis(
    py: Python<'_>,
    analyzer: &SkinToneAnalyzer,
    path: PathBuf,
) -> PyResult<Py<PyDict>> {
    // Last-resort guard: the analyzer already catches its own failures, but a
    // panic here must still yield the shared fallback, not a Python exception.
    let result = py.allow_threads(|| {
        panic::catch_unwind(AssertUnwindSafe(|| analyzer.analyze(&path)))
            .unwrap_or_else(|_| DetectionResult::fallback(messages::ANALYSIS_FAILED))
    });
    Ok(result_to_dict(py, &result)?.into())
}

/// Analyzers for the module-level `analyze`, keyed by margin bits and model
/// path, so the detector model is read once per setting.
type AnalyzerCache = HashMap<(Option<u64>, Option<PathBuf>), Arc<SkinToneAnalyzer>>;

fn cached_analyzer(
    margin_ratio: Option<f64>,
    model_path: Option<PathBuf>,
) -> Result<Arc<SkinToneAnalyzer>, SkinToneError> {
    static CACHE: OnceLock<Mutex<AnalyzerCache>> = OnceLock::new();

    let key = (margin_ratio.map(f64::to_bits), model_path.clone());
    let mut cache = CACHE
        .get_or_init(Default::default)
        .lock()
        .unwrap_or_else(PoisonError::into_inner);
    if let Some(analyzer) = cache.get(&key) {
        return Ok(Arc::clone(analyzer));
    }

    let config = build_config(margin_ratio, model_path, None)?;
    let analyzer = Arc::new(SkinToneAnalyzer::with_config(config)?);
    cache.insert(key, Arc::clone(&analyzer));
    Ok(analyzer)
}

/// Reusable analyzer holding its configuration and loaded detector.
///
/// Args:
///     margin_ratio: Face margin as a fraction of the face size (default: 0.2)
///     model_path: SeetaFace model file; without it the center region is sampled
///     config_path: JSON configuration file; explicit arguments override it
#[pyclass(name = "SkinToneAnalyzer", frozen)]
struct PyAnalyzer {
    inner: SkinToneAnalyzer,
}

#[pymethods]
impl PyAnalyzer {
    #[new]
    #[pyo3(signature = (*, margin_ratio=None, model_path=None, config_path=None))]
    fn new(
        margin_ratio: Option<f64>,
        model_path: Option<PathBuf>,
        config_path: Option<PathBuf>,
    ) -> PyResult<Self> {
        let config = build_config(margin_ratio, model_path, config_path).map_err(to_py_err)?;
        let inner = SkinToneAnalyzer::with_config(config).map_err(to_py_err)?;
        Ok(Self { inner })
    }

    /// Estimate the skin tone of the photo at `path`; same result as the
    /// module-level `analyze`.
    fn analyze(&self, py: Python<'_>, path: PathBuf) -> PyResult<Py<PyDict>> {
        run_analysis(py, &self.inner, path)
    }

    /// Validate an upload against this analyzer's upload policy.
    fn check_upload(&self, filename: &str, size: u64) -> PyResult<()> {
        self.inner
            .config()
            .upload
            .check(filename, size)
            .map_err(to_py_err)
    }

    #[getter]
    fn margin_ratio(&self) -> f64 {
        self.inner.config().margin_ratio
    }

    #[getter]
    fn has_detector(&self) -> bool {
        self.inner.has_detector()
    }
}

/// Estimate the skin tone of the photo at `path`.
///
/// Args:
///     path: Image file (PNG, JPEG, GIF or WebP)
///     margin_ratio: Face margin as a fraction of the face size (default: 0.2)
///     model_path: SeetaFace model file; without it the center region is sampled
///
/// Returns:
///     dict with keys: skin_tone (str), rgb (list[int]), r, g, b (float),
///                     face_detected (bool), message (str)
///
/// Never raises for problems with the image itself; those return the
/// fallback result. Invalid arguments raise ValueError. Analyzers are cached
/// per (margin_ratio, model_path).
#[pyfunction]
#[pyo3(signature = (path, *, margin_ratio=None, model_path=None))]
fn analyze(
    py: Python<'_>,
    path: PathBuf,
    margin_ratio: Option<f64>,
    model_path: Option<PathBuf>,
) -> PyResult<Py<PyDict>> {
    let analyzer = cached_analyzer(margin_ratio, model_path).map_err(to_py_err)?;
    run_analysis(py, &analyzer, path)
}

/// Styling recommendations for a tone and presentation.
///
/// Args:
///     skin_tone: "Fair", "Medium", "Olive" or "Deep"
///     gender: "Male" or "Female"; anything else is treated as "Female"
///     rgb: measured color as [r, g, b]
///
/// Returns:
///     dict with keys: dress_codes, hairstyle, accessories, color_palette,
///                     reasoning, shopping_links
#[pyfunction]
#[pyo3(signature = (skin_tone, gender=None, rgb=None))]
fn recommend(
    py: Python<'_>,
    skin_tone: &str,
    gender: Option<&str>,
    rgb: Option<[u8; 3]>,
) -> PyResult<Py<PyDict>> {
    let tone: SkinTone = skin_tone.parse().map_err(to_py_err)?;
    let presentation = Presentation::from_form_value(gender);
    let rec = recommend_or_template(
        &TemplateRecommender,
        tone,
        presentation,
        rgb.unwrap_or(FALLBACK_RGB),
    );
    Ok(recommendation_to_dict(py, &rec)?.into())
}

/// Validate an upload's file name and size.
///
/// Args:
///     config_path: JSON configuration whose `upload` section applies;
///                  the default policy otherwise
///
/// Raises:
///     ValueError: with a user-facing message if the upload is rejected
#[pyfunction]
#[pyo3(signature = (filename, size, *, config_path=None))]
fn check_upload(filename: &str, size: u64, config_path: Option<PathBuf>) -> PyResult<()> {
    build_config(None, None, config_path)
        .and_then(|config| config.upload.check(filename, size))
        .map_err(to_py_err)
}

#[pymodule]
fn skintone(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_function(wrap_pyfunction!(analyze, m)?)?;
    m.add_function(wrap_pyfunction!(recommend, m)?)?;
    m.add_function(wrap_pyfunction!(check_upload, m)?)?;
    m.add_class::<PyAnalyzer>()?;
    m.add("FALLBACK_TONE", FALLBACK_TONE.as_str())?;
    m.add("FALLBACK_RGB", PyList::new(m.py(), FALLBACK_RGB.map(u32::from))?)?;
    m.add(
        "SKIN_TONES",
        SkinTone::ALL.iter().map(|t| t.as_str()).collect::<Vec<_>>(),
    )?;
    Ok(())
}
