//! Evaluator for the expression subset emitted by the query layer.

use std::collections::BTreeMap;

use biomecode_core::error::{BiomeError, Result};
use biomecode_core::models::Region;
use serde_json::{json, Value as JsonValue};

use super::{Catalog, MemoryFeature, MemoryImage};
use crate::expr::{FunctionInvocation, ValueNode, MAX_PIXELS};

/// Evaluated value
#[derive(Debug, Clone)]
pub(crate) enum Val {
    Null,
    Bool(bool),
    Number(f64),
    String(String),
    List(Vec<Val>),
    Dict(BTreeMap<String, Val>),
    Image(MemoryImage),
    Collection(Vec<MemoryImage>),
    Geometry(Region),
    Filter(CalendarFilter),
    Reducer(ReducerKind),
    Classifier(ClassifierState),
    Table(Vec<MemoryFeature>),
}

#[derive(Debug, Clone)]
pub(crate) struct CalendarFilter {
    start: i64,
    end: i64,
    field: String,
}

#[derive(Debug, Clone)]
pub(crate) enum ReducerKind {
    Sum,
    Mean,
    Group { inner: Box<ReducerKind>, field: usize, name: String },
}

#[derive(Debug, Clone)]
pub(crate) enum ClassifierState {
    Untrained,
    Trained { inputs: Vec<String>, samples: Vec<(Vec<f64>, f64)> },
}

impl Val {
    pub fn type_name(&self) -> &'static str {
        match self {
            Val::Null => "null",
            Val::Bool(_) => "Boolean",
            Val::Number(_) => "Number",
            Val::String(_) => "String",
            Val::List(_) => "List",
            Val::Dict(_) => "Dictionary",
            Val::Image(_) => "Image",
            Val::Collection(_) => "ImageCollection",
            Val::Geometry(_) => "Geometry",
            Val::Filter(_) => "Filter",
            Val::Reducer(_) => "Reducer",
            Val::Classifier(_) => "Classifier",
            Val::Table(_) => "FeatureCollection",
        }
    }

    fn from_json(value: &JsonValue) -> Self {
        match value {
            JsonValue::Null => Val::Null,
            JsonValue::Bool(b) => Val::Bool(*b),
            JsonValue::Number(n) => n.as_f64().map(Val::Number).unwrap_or(Val::Null),
            JsonValue::String(s) => Val::String(s.clone()),
            JsonValue::Array(items) => Val::List(items.iter().map(Val::from_json).collect()),
            JsonValue::Object(map) => {
                Val::Dict(map.iter().map(|(k, v)| (k.clone(), Val::from_json(v))).collect())
            }
        }
    }

    pub fn into_json(self) -> JsonValue {
        match self {
            Val::Null => JsonValue::Null,
            Val::Bool(b) => JsonValue::Bool(b),
            Val::Number(n) => {
                serde_json::Number::from_f64(n).map(JsonValue::Number).unwrap_or_default()
            }
            Val::String(s) => JsonValue::String(s),
            Val::List(items) => JsonValue::Array(items.into_iter().map(Val::into_json).collect()),
            Val::Dict(map) => {
                JsonValue::Object(map.into_iter().map(|(k, v)| (k, v.into_json())).collect())
            }
            Val::Image(image) => json!({
                "type": "Image",
                "bands": image.band_names().iter().map(|b| json!({ "id": b })).collect::<Vec<_>>(),
            }),
            other => json!({ "type": other.type_name() }),
        }
    }
}

fn failure(message: impl Into<String>) -> BiomeError {
    BiomeError::RemoteEvaluation { status: "INVALID_ARGUMENT".to_string(), message: message.into() }
}

/// Arguments of one invocation, evaluated
struct Args<'a> {
    function: &'a str,
    values: BTreeMap<String, Val>,
}

impl Args<'_> {
    fn optional(&self, name: &str) -> Option<&Val> {
        match self.values.get(name) {
            None | Some(Val::Null) => None,
            Some(v) => Some(v),
        }
    }

    fn required(&self, name: &str) -> Result<&Val> {
        self.optional(name).ok_or_else(|| {
            failure(format!("{}: Parameter '{}' is required.", self.function, name))
        })
    }

    fn invalid(&self, name: &str, expected: &str, got: &Val) -> BiomeError {
        failure(format!(
            "{}: Invalid type for parameter '{}'. Expected {}, got {}.",
            self.function,
            name,
            expected,
            got.type_name()
        ))
    }

    fn image(&self, name: &str) -> Result<MemoryImage> {
        match self.required(name)? {
            Val::Image(image) => Ok(image.clone()),
            // Plain numbers promote to constant images
            Val::Number(n) => Ok(MemoryImage::from_bands(vec![("constant".to_string(), *n)])),
            other => Err(self.invalid(name, "Image", other)),
        }
    }

    fn number(&self, name: &str) -> Result<f64> {
        match self.required(name)? {
            Val::Number(n) => Ok(*n),
            other => Err(self.invalid(name, "Number", other)),
        }
    }

    fn string(&self, name: &str) -> Result<String> {
        match self.required(name)? {
            Val::String(s) => Ok(s.clone()),
            other => Err(self.invalid(name, "String", other)),
        }
    }

    fn strings(&self, name: &str) -> Result<Vec<String>> {
        match self.required(name)? {
            Val::String(s) => Ok(vec![s.clone()]),
            Val::List(items) => items
                .iter()
                .map(|item| match item {
                    Val::String(s) => Ok(s.clone()),
                    other => Err(self.invalid(name, "List<String>", other)),
                })
                .collect(),
            other => Err(self.invalid(name, "List<String>", other)),
        }
    }

    fn flag(&self, name: &str) -> Result<bool> {
        match self.optional(name) {
            None => Ok(false),
            Some(Val::Bool(b)) => Ok(*b),
            Some(other) => Err(self.invalid(name, "Boolean", other)),
        }
    }

    fn collection(&self, name: &str) -> Result<Vec<MemoryImage>> {
        match self.required(name)? {
            Val::Collection(images) => Ok(images.clone()),
            other => Err(self.invalid(name, "ImageCollection", other)),
        }
    }

    fn reducer(&self, name: &str) -> Result<ReducerKind> {
        match self.required(name)? {
            Val::Reducer(reducer) => Ok(reducer.clone()),
            other => Err(self.invalid(name, "Reducer", other)),
        }
    }

    fn geometry(&self, name: &str) -> Result<Region> {
        match self.required(name)? {
            Val::Geometry(region) => Ok(region.clone()),
            other => Err(self.invalid(name, "Geometry", other)),
        }
    }
}

/// Context inherited by nested invocations
#[derive(Debug, Clone, Copy, Default)]
struct Context {
    /// Nominal pixel size of the enclosing reduction, in metres
    scale: Option<f64>,
}

pub(crate) struct Evaluator<'a> {
    catalog: &'a Catalog,
}

impl<'a> Evaluator<'a> {
    pub fn new(catalog: &'a Catalog) -> Self {
        Self { catalog }
    }

    pub fn eval_root(&self, node: &ValueNode) -> Result<Val> {
        self.eval(node, Context::default())
    }

    fn eval(&self, node: &ValueNode, ctx: Context) -> Result<Val> {
        match node {
            ValueNode::ConstantValue(value) => Ok(Val::from_json(value)),
            ValueNode::ArrayValue { values } => {
                Ok(Val::List(values.iter().map(|v| self.eval(v, ctx)).collect::<Result<_>>()?))
            }
            ValueNode::DictionaryValue { values } => Ok(Val::Dict(
                values
                    .iter()
                    .map(|(k, v)| Ok((k.clone(), self.eval(v, ctx)?)))
                    .collect::<Result<_>>()?,
            )),
            ValueNode::FunctionInvocationValue(call) => self.invoke(call, ctx),
        }
    }

    fn invoke(&self, call: &FunctionInvocation, ctx: Context) -> Result<Val> {
        let function = call.function_name.as_str();

        if let Some(kind) = function.strip_prefix("GeometryConstructors.") {
            return construct_geometry(kind, call);
        }

        // The scale of a reduction applies to everything beneath it
        let ctx = match (function, call.arguments.get("scale")) {
            ("Image.reduceRegion", Some(ValueNode::ConstantValue(scale))) => {
                Context { scale: scale.as_f64().or(ctx.scale) }
            }
            _ => ctx,
        };

        let values = call
            .arguments
            .iter()
            .map(|(k, v)| Ok((k.clone(), self.eval(v, ctx)?)))
            .collect::<Result<BTreeMap<_, _>>>()?;
        let args = Args { function, values };

        match function {
            "Image.load" => {
                let id = args.string("id")?;
                self.catalog
                    .images
                    .get(&id)
                    .cloned()
                    .map(Val::Image)
                    .ok_or_else(|| failure(format!("Image asset '{}' not found.", id)))
            }
            "ImageCollection.load" => {
                let id = args.string("id")?;
                self.catalog
                    .collections
                    .get(&id)
                    .cloned()
                    .map(Val::Collection)
                    .ok_or_else(|| failure(format!("ImageCollection asset '{}' not found.", id)))
            }
            "Collection.loadTable" => {
                let id = args.string("tableId")?;
                self.catalog
                    .tables
                    .get(&id)
                    .cloned()
                    .map(Val::Table)
                    .ok_or_else(|| failure(format!("Table asset '{}' not found.", id)))
            }
            "Filter.calendarRange" => {
                let field = args.string("field")?;
                if field != "year" && field != "month" {
                    return Err(failure(format!(
                        "Filter.calendarRange: Unsupported calendar field '{}'.",
                        field
                    )));
                }
                Ok(Val::Filter(CalendarFilter {
                    start: args.number("start")? as i64,
                    end: args.number("end")? as i64,
                    field,
                }))
            }
            "Collection.filter" => {
                let images = args.collection("collection")?;
                let filter = match args.required("filter")? {
                    Val::Filter(filter) => filter.clone(),
                    other => return Err(args.invalid("filter", "Filter", other)),
                };
                Ok(Val::Collection(
                    images
                        .into_iter()
                        .filter(|image| {
                            image
                                .calendar_field(&filter.field)
                                .is_some_and(|v| v >= filter.start && v <= filter.end)
                        })
                        .collect(),
                ))
            }
            "Collection.first" => {
                Ok(args.collection("collection")?.into_iter().next().map_or(Val::Null, Val::Image))
            }
            "reduce.mean" => {
                Ok(Val::Image(reduce_collection(&args.collection("collection")?, true)))
            }
            "reduce.sum" => {
                Ok(Val::Image(reduce_collection(&args.collection("collection")?, false)))
            }
            "Image.constant" => Ok(Val::Image(MemoryImage::from_bands(vec![(
                "constant".to_string(),
                args.number("value")?,
            )]))),
            "Image.pixelArea" => {
                let scale = ctx.scale.unwrap_or(1.0);
                Ok(Val::Image(MemoryImage::from_bands(vec![("area".to_string(), scale * scale)])))
            }
            "Image.clip" => {
                args.geometry("geometry")?;
                Ok(Val::Image(args.image("input")?))
            }
            "Image.select" => select(&args.image("input")?, &args.strings("bandSelectors")?),
            "Image.rename" => rename(&args.image("input")?, &args.strings("names")?),
            "Image.add" => binary(&args, |a, b| a + b),
            "Image.subtract" => binary(&args, |a, b| a - b),
            "Image.multiply" => binary(&args, |a, b| a * b),
            "Image.divide" => binary(&args, |a, b| if b == 0.0 { 0.0 } else { a / b }),
            "Image.reduce" => {
                let image = args.image("image")?;
                let values: Vec<f64> = image.bands().iter().map(|(_, v)| *v).collect();
                let (name, value) = match args.reducer("reducer")? {
                    ReducerKind::Sum => ("sum", values.iter().sum()),
                    ReducerKind::Mean => ("mean", mean(&values)),
                    ReducerKind::Group { .. } => {
                        return Err(failure("Image.reduce: Grouped reducers are not supported."))
                    }
                };
                Ok(Val::Image(MemoryImage::from_bands(vec![(name.to_string(), value)])))
            }
            "Image.addBands" => {
                let dst = args.image("dstImg")?;
                let src = args.image("srcImg")?;
                Ok(Val::Image(add_bands(dst, src, args.flag("overwrite")?)))
            }
            "Image.updateMask" => {
                args.image("mask")?;
                Ok(Val::Image(args.image("image")?))
            }
            "Image.visualize" => {
                let image = args.image("image")?;
                let min = args.number("min")?;
                let max = args.number("max")?;
                let value = image.bands().first().map(|(_, v)| *v).unwrap_or(0.0);
                let stretched =
                    if max > min { ((value - min) / (max - min)).clamp(0.0, 1.0) } else { 0.0 };
                let level = (stretched * 255.0).round();
                Ok(Val::Image(MemoryImage::from_bands(
                    ["vis-red", "vis-green", "vis-blue"]
                        .iter()
                        .map(|b| (b.to_string(), level))
                        .collect(),
                )))
            }
            "Reducer.sum" => Ok(Val::Reducer(ReducerKind::Sum)),
            "Reducer.mean" => Ok(Val::Reducer(ReducerKind::Mean)),
            "Reducer.group" => Ok(Val::Reducer(ReducerKind::Group {
                inner: Box::new(args.reducer("reducer")?),
                field: args.number("groupField")? as usize,
                name: args
                    .optional("groupName")
                    .map(|_| args.string("groupName"))
                    .transpose()?
                    .unwrap_or_else(|| "group".to_string()),
            })),
            "Classifier.smileRandomForest" => {
                args.number("numberOfTrees")?;
                Ok(Val::Classifier(ClassifierState::Untrained))
            }
            "Classifier.train" => train(&args),
            "Image.classify" => classify(&args),
            "Image.reduceRegion" => reduce_region(&args),
            "Dictionary.get" => {
                let key = args.string("key")?;
                match args.required("dictionary")? {
                    Val::Dict(map) => map.get(&key).cloned().ok_or_else(|| {
                        failure(format!(
                            "Dictionary.get: Dictionary does not contain key: '{}'.",
                            key
                        ))
                    }),
                    other => Err(args.invalid("dictionary", "Dictionary", other)),
                }
            }
            other => Err(failure(format!("Unknown function: {}", other))),
        }
    }
}

fn construct_geometry(kind: &str, call: &FunctionInvocation) -> Result<Val> {
    let coordinates = match call.arguments.get("coordinates") {
        Some(ValueNode::ConstantValue(coordinates)) => coordinates,
        _ => {
            return Err(failure(format!(
                "GeometryConstructors.{}: Parameter 'coordinates' is required.",
                kind
            )))
        }
    };

    Region::from_geojson_value(&json!({ "type": kind, "coordinates": coordinates }))
        .map(Val::Geometry)
        .map_err(|e| failure(format!("GeometryConstructors.{}: {}", kind, e)))
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    }
}

/// Per-band mean or sum across a collection; band set of the first image
fn reduce_collection(images: &[MemoryImage], average: bool) -> MemoryImage {
    let Some(first) = images.first() else {
        return MemoryImage::new();
    };

    let bands = first
        .bands()
        .iter()
        .map(|(name, _)| {
            let values: Vec<f64> = images.iter().filter_map(|image| image.band(name)).collect();
            let value = if average { mean(&values) } else { values.iter().sum() };
            (name.clone(), value)
        })
        .collect();

    MemoryImage::from_bands(bands)
}

fn select(image: &MemoryImage, selectors: &[String]) -> Result<Val> {
    let bands = selectors
        .iter()
        .map(|selector| {
            image.band(selector).map(|v| (selector.clone(), v)).ok_or_else(|| {
                failure(format!("Image.select: Pattern '{}' did not match any bands.", selector))
            })
        })
        .collect::<Result<_>>()?;

    Ok(Val::Image(MemoryImage::from_bands(bands)))
}

fn rename(image: &MemoryImage, names: &[String]) -> Result<Val> {
    if names.len() != image.bands().len() {
        return Err(failure(format!(
            "Image.rename: Can't rename {} bands to {} names.",
            image.bands().len(),
            names.len()
        )));
    }

    Ok(Val::Image(MemoryImage::from_bands(
        names.iter().cloned().zip(image.bands().iter().map(|(_, v)| *v)).collect(),
    )))
}

/// Band-wise arithmetic; a single-band operand is broadcast over the other
fn binary(args: &Args<'_>, op: impl Fn(f64, f64) -> f64) -> Result<Val> {
    let left = args.image("image1")?;
    let right = args.image("image2")?;
    let (l, r) = (left.bands(), right.bands());

    let bands = if r.len() == 1 {
        l.iter().map(|(n, v)| (n.clone(), op(*v, r[0].1))).collect()
    } else if l.len() == 1 {
        r.iter().map(|(n, v)| (n.clone(), op(l[0].1, *v))).collect()
    } else if l.len() == r.len() {
        l.iter().zip(r).map(|((n, a), (_, b))| (n.clone(), op(*a, *b))).collect()
    } else {
        return Err(failure(format!(
            "{}: Images must contain the same number of bands or only 1 band. Got {} and {}.",
            args.function,
            l.len(),
            r.len()
        )));
    };

    Ok(Val::Image(MemoryImage::from_bands(bands)))
}

fn add_bands(dst: MemoryImage, src: MemoryImage, overwrite: bool) -> MemoryImage {
    let mut bands: Vec<(String, f64)> = dst.bands().to_vec();

    for (name, value) in src.bands() {
        match bands.iter_mut().find(|(n, _)| n == name) {
            Some(existing) if overwrite => existing.1 = *value,
            Some(_) => bands.push((format!("{}_1", name), *value)),
            None => bands.push((name.clone(), *value)),
        }
    }

    MemoryImage::from_bands(bands)
}

fn train(args: &Args<'_>) -> Result<Val> {
    match args.required("classifier")? {
        Val::Classifier(_) => {}
        other => return Err(args.invalid("classifier", "Classifier", other)),
    }
    let features = match args.required("features")? {
        Val::Table(features) => features.clone(),
        other => return Err(args.invalid("features", "FeatureCollection", other)),
    };
    let class_property = args.string("classProperty")?;
    let inputs = args.strings("inputProperties")?;

    if features.is_empty() {
        return Err(failure("Classifier.train: No valid training data were found."));
    }

    let samples = features
        .iter()
        .enumerate()
        .map(|(i, feature)| {
            let missing = |p: &str| {
                failure(format!(
                    "Classifier.train: Property '{}' of feature '{}' is missing.",
                    p, i
                ))
            };
            let label = feature.property(&class_property).ok_or_else(|| missing(&class_property))?;
            let vector = inputs
                .iter()
                .map(|p| feature.property(p).ok_or_else(|| missing(p)))
                .collect::<Result<Vec<_>>>()?;
            Ok((vector, label))
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(Val::Classifier(ClassifierState::Trained { inputs, samples }))
}

/// Nearest labelled sample in input space
fn classify(args: &Args<'_>) -> Result<Val> {
    let image = args.image("image")?;
    let output = match args.optional("outputName") {
        Some(_) => args.string("outputName")?,
        None => "classification".to_string(),
    };
    let (inputs, samples) = match args.required("classifier")? {
        Val::Classifier(ClassifierState::Trained { inputs, samples }) => (inputs, samples),
        Val::Classifier(ClassifierState::Untrained) => {
            return Err(failure("Image.classify: Classifier has not been trained."))
        }
        other => return Err(args.invalid("classifier", "Classifier", other)),
    };

    let pixel = inputs
        .iter()
        .map(|name| {
            image.band(name).ok_or_else(|| {
                failure(format!("Image.classify: Band '{}' is required by the classifier.", name))
            })
        })
        .collect::<Result<Vec<_>>>()?;

    let distance = |sample: &[f64]| -> f64 {
        sample.iter().zip(&pixel).map(|(a, b)| (a - b) * (a - b)).sum()
    };
    let label = samples
        .iter()
        .min_by(|(a, _), (b, _)| distance(a).total_cmp(&distance(b)))
        .map(|(_, label)| *label)
        .unwrap_or(0.0);

    Ok(Val::Image(MemoryImage::from_bands(vec![(output, label)])))
}

fn reduce_region(args: &Args<'_>) -> Result<Val> {
    let image = args.image("image")?;
    let reducer = args.reducer("reducer")?;
    let region = args.geometry("geometry")?;
    let scale = args.number("scale")?;
    let max_pixels = args.optional("maxPixels").map(|_| args.number("maxPixels")).transpose()?;

    if scale <= 0.0 {
        return Err(failure("Image.reduceRegion: Scale must be positive."));
    }

    let pixels = (region.geodesic_area() / (scale * scale)).round().max(1.0);
    if pixels > max_pixels.unwrap_or(MAX_PIXELS) {
        return Err(failure(format!(
            "Image.reduceRegion: Too many pixels in the region. \
             Found {}, but maxPixels allows only {}.",
            pixels,
            max_pixels.unwrap_or(MAX_PIXELS)
        )));
    }

    let reduce = |kind: &ReducerKind, value: f64| match kind {
        ReducerKind::Sum => value * pixels,
        _ => value,
    };

    let result = match &reducer {
        ReducerKind::Group { inner, field, name } => {
            let bands = image.bands();
            let Some((_, label)) = bands.get(*field) else {
                return Err(failure(format!(
                    "Image.reduceRegion: Group field {} is out of range for {} bands.",
                    field,
                    bands.len()
                )));
            };
            let value_band = bands.iter().enumerate().find(|(i, _)| i != field);
            let Some((_, (_, value))) = value_band else {
                return Err(failure("Image.reduceRegion: Grouped reduction needs a value band."));
            };
            let inner_name = match inner.as_ref() {
                ReducerKind::Sum => "sum",
                _ => "mean",
            };

            let mut group = BTreeMap::new();
            group.insert(name.clone(), Val::Number(*label));
            group.insert(inner_name.to_string(), Val::Number(reduce(inner, *value)));
            BTreeMap::from([("groups".to_string(), Val::List(vec![Val::Dict(group)]))])
        }
        kind => image
            .bands()
            .iter()
            .map(|(name, value)| (name.clone(), Val::Number(reduce(kind, *value))))
            .collect(),
    };

    Ok(Val::Dict(result))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::{Classifier, FeatureCollection, Image, ImageCollection, Reducer};
    use biomecode_core::models::Geometry;

    fn catalog() -> Catalog {
        let mut catalog = Catalog::default();
        catalog.images.insert(
            "img".to_string(),
            MemoryImage::new().with_band("a", 1.0).with_band("b", 2.0),
        );
        catalog.collections.insert(
            "col".to_string(),
            vec![
                MemoryImage::new().with_band("v", 2.0).dated(2020, 1),
                MemoryImage::new().with_band("v", 4.0).dated(2020, 2),
            ],
        );
        catalog.tables.insert(
            "samples".to_string(),
            vec![
                MemoryFeature::new().with_property("x", 0.0).with_property("label", 1.0),
                MemoryFeature::new().with_property("x", 10.0).with_property("label", 2.0),
            ],
        );
        catalog
    }

    fn eval(node: impl Into<ValueNode>) -> Result<JsonValue> {
        let catalog = catalog();
        Evaluator::new(&catalog).eval_root(&node.into()).map(Val::into_json)
    }

    fn hectare() -> Region {
        // Roughly 111 m x 111 m at the equator
        Region::new(Geometry::bbox(0.0, 0.0, 0.001, 0.001))
    }

    #[test]
    fn test_collection_reductions() {
        let region = hectare();
        let mean =
            ImageCollection::load("col").mean().reduce_region(Reducer::mean(), &region, 10.0);
        assert_eq!(eval(mean).unwrap(), json!({ "v": 3.0 }));

        let sum =
            ImageCollection::load("col").sum().reduce_region(Reducer::mean(), &region, 10.0);
        assert_eq!(eval(sum).unwrap(), json!({ "v": 6.0 }));
    }

    #[test]
    fn test_add_bands_overwrite() {
        let src = Image::constant(9.0).rename(&["a"]);
        let overwritten = Image::load("img").add_bands(src.clone(), true).select(&["a", "b"]);
        let value = eval(overwritten.reduce_region(Reducer::mean(), &hectare(), 10.0)).unwrap();
        assert_eq!(value, json!({ "a": 9.0, "b": 2.0 }));

        let appended = Image::load("img").add_bands(src, false);
        let value = eval(appended.reduce_region(Reducer::mean(), &hectare(), 10.0)).unwrap();
        assert_eq!(value, json!({ "a": 1.0, "b": 2.0, "a_1": 9.0 }));
    }

    #[test]
    fn test_select_missing_band() {
        let err = eval(Image::load("img").select(&["zzz"])).unwrap_err();
        assert!(err.to_string().contains("Pattern 'zzz' did not match any bands"));
    }

    #[test]
    fn test_rename_requires_matching_count() {
        assert!(eval(Image::load("img").rename(&["only"])).is_err());
    }

    #[test]
    fn test_sum_scales_with_pixel_count() {
        let region = hectare();
        let pixels = (region.geodesic_area() / 100.0).round();
        let value =
            eval(Image::constant(2.0).reduce_region(Reducer::sum(), &region, 10.0)).unwrap();
        assert_eq!(value, json!({ "constant": 2.0 * pixels }));
    }

    #[test]
    fn test_pixel_area_follows_scale() {
        let region = hectare();
        let area = Image::pixel_area()
            .divide(Image::constant(1e4))
            .reduce_region(Reducer::sum(), &region, 10.0);
        let value = eval(area).unwrap();
        let hectares = value["area"].as_f64().unwrap();
        assert!((hectares - region.geodesic_area() / 1e4).abs() < 0.01);
    }

    #[test]
    fn test_grouped_sum() {
        let image = Image::constant(5.0).add_bands(Image::constant(3.0).rename(&["class"]), false);
        let dict = image.reduce_region(Reducer::sum().group(1, "class"), &hectare(), 100.0);
        let value = eval(dict).unwrap();

        let groups = value["groups"].as_array().unwrap();
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0]["class"], json!(3.0));
        assert!(groups[0]["sum"].as_f64().unwrap() > 0.0);
    }

    #[test]
    fn test_classify_nearest_sample() {
        let classifier = Classifier::smile_random_forest(10).train(
            FeatureCollection::load("samples"),
            "label",
            &["x"],
        );
        let image = Image::constant(8.0).rename(&["x"]).classify(classifier, "class");
        let value = eval(image.reduce_region(Reducer::mean(), &hectare(), 10.0)).unwrap();
        assert_eq!(value, json!({ "class": 2.0 }));
    }

    #[test]
    fn test_untrained_classifier() {
        let image = Image::constant(8.0)
            .rename(&["x"])
            .classify(Classifier::smile_random_forest(10), "class");
        assert!(eval(image).is_err());
    }

    #[test]
    fn test_visualize_clamps() {
        let image = Image::constant(7.0).visualize(0.0, 1.0);
        let value = eval(image.reduce_region(Reducer::mean(), &hectare(), 10.0)).unwrap();
        assert_eq!(value["vis-red"], json!(255.0));
    }

    #[test]
    fn test_dictionary_get() {
        let dict = Image::load("img").reduce_region(Reducer::mean(), &hectare(), 10.0);
        assert_eq!(eval(dict.clone().get("b")).unwrap(), json!(2.0));
        assert!(eval(dict.get("c")).is_err());
    }

    #[test]
    fn test_unknown_function() {
        let err = eval(ValueNode::invoke("Image.frobnicate", [])).unwrap_err();
        assert!(err.to_string().contains("Unknown function: Image.frobnicate"));
    }
}
