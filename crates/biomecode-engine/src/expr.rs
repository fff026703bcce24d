//! Expression graph understood by the remote platform.
//!
//! An [`Expression`] is a table of value nodes plus the key of the node to
//! evaluate. This crate only ever emits a single root node with its
//! arguments nested inline:
//!
//! ```json
//! { "result": "0",
//!   "values": { "0": { "functionInvocationValue": {
//!       "functionName": "Image.clip",
//!       "arguments": { "input": { ... }, "geometry": { ... } } } } } }
//! ```
//!
//! The typed wrappers ([`Image`], [`ImageCollection`], ...) only exist to keep
//! argument names right at the call site; they all lower to [`ValueNode`].

use std::collections::BTreeMap;

use biomecode_core::models::Region;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

/// Pixel budget passed to every regional reduction
pub const MAX_PIXELS: f64 = 1e13;

/// A node of the expression graph
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ValueNode {
    ConstantValue(JsonValue),
    FunctionInvocationValue(FunctionInvocation),
    ArrayValue { values: Vec<ValueNode> },
    DictionaryValue { values: BTreeMap<String, ValueNode> },
}

/// Call of a named platform function
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FunctionInvocation {
    pub function_name: String,
    #[serde(default)]
    pub arguments: BTreeMap<String, ValueNode>,
}

impl ValueNode {
    pub fn constant(value: impl Into<JsonValue>) -> Self {
        ValueNode::ConstantValue(value.into())
    }

    pub fn strings(values: &[&str]) -> Self {
        ValueNode::ConstantValue(JsonValue::from(values.to_vec()))
    }

    pub fn invoke<'a>(
        function_name: &str,
        arguments: impl IntoIterator<Item = (&'a str, ValueNode)>,
    ) -> Self {
        ValueNode::FunctionInvocationValue(FunctionInvocation {
            function_name: function_name.to_string(),
            arguments: arguments.into_iter().map(|(k, v)| (k.to_string(), v)).collect(),
        })
    }

    /// Name of the invoked function, if this node is an invocation
    pub fn function_name(&self) -> Option<&str> {
        match self {
            ValueNode::FunctionInvocationValue(call) => Some(&call.function_name),
            _ => None,
        }
    }

    /// Geometry constructor for a region
    pub fn geometry(region: &Region) -> Self {
        let geometry = region.geometry();
        Self::invoke(
            &format!("GeometryConstructors.{}", geometry.type_name()),
            [("coordinates", Self::constant(geometry.coordinates()))],
        )
    }

    /// Every function name reachable from this node, depth first
    pub fn function_names(&self) -> Vec<String> {
        let mut names = Vec::new();
        self.collect_function_names(&mut names);
        names
    }

    fn collect_function_names(&self, names: &mut Vec<String>) {
        match self {
            ValueNode::ConstantValue(_) => {}
            ValueNode::FunctionInvocationValue(call) => {
                names.push(call.function_name.clone());
                for arg in call.arguments.values() {
                    arg.collect_function_names(names);
                }
            }
            ValueNode::ArrayValue { values } => {
                for v in values {
                    v.collect_function_names(names);
                }
            }
            ValueNode::DictionaryValue { values } => {
                for v in values.values() {
                    v.collect_function_names(names);
                }
            }
        }
    }
}

/// Serialized expression sent for evaluation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Expression {
    pub result: String,
    pub values: BTreeMap<String, ValueNode>,
}

impl Expression {
    pub fn new(root: impl Into<ValueNode>) -> Self {
        let mut values = BTreeMap::new();
        values.insert("0".to_string(), root.into());
        Self { result: "0".to_string(), values }
    }

    /// The node named by `result`
    pub fn root(&self) -> Option<&ValueNode> {
        self.values.get(&self.result)
    }
}

macro_rules! node_wrapper {
    ($($name:ident),* $(,)?) => {
        $(
            #[derive(Debug, Clone, PartialEq)]
            pub struct $name(ValueNode);

            impl $name {
                pub fn into_node(self) -> ValueNode {
                    self.0
                }
            }

            impl From<$name> for ValueNode {
                fn from(value: $name) -> Self {
                    value.0
                }
            }
        )*
    };
}

node_wrapper!(Image, ImageCollection, Reducer, Filter, Classifier, FeatureCollection, Dictionary);

impl Image {
    pub fn load(id: &str) -> Self {
        Self(ValueNode::invoke("Image.load", [("id", ValueNode::constant(id))]))
    }

    pub fn constant(value: f64) -> Self {
        Self(ValueNode::invoke("Image.constant", [("value", ValueNode::constant(value))]))
    }

    /// Area of each pixel in square metres
    pub fn pixel_area() -> Self {
        Self(ValueNode::invoke("Image.pixelArea", []))
    }

    pub fn clip(self, region: &Region) -> Self {
        Self(ValueNode::invoke(
            "Image.clip",
            [("input", self.0), ("geometry", ValueNode::geometry(region))],
        ))
    }

    pub fn select(self, bands: &[&str]) -> Self {
        Self(ValueNode::invoke(
            "Image.select",
            [("input", self.0), ("bandSelectors", ValueNode::strings(bands))],
        ))
    }

    pub fn rename(self, names: &[&str]) -> Self {
        Self(ValueNode::invoke(
            "Image.rename",
            [("input", self.0), ("names", ValueNode::strings(names))],
        ))
    }

    pub fn multiply(self, other: Image) -> Self {
        self.binary("Image.multiply", other)
    }

    pub fn add(self, other: Image) -> Self {
        self.binary("Image.add", other)
    }

    pub fn subtract(self, other: Image) -> Self {
        self.binary("Image.subtract", other)
    }

    pub fn divide(self, other: Image) -> Self {
        self.binary("Image.divide", other)
    }

    fn binary(self, function_name: &str, other: Image) -> Self {
        Self(ValueNode::invoke(function_name, [("image1", self.0), ("image2", other.0)]))
    }

    /// Reduce across bands, per pixel
    pub fn reduce(self, reducer: Reducer) -> Self {
        Self(ValueNode::invoke("Image.reduce", [("image", self.0), ("reducer", reducer.0)]))
    }

    pub fn add_bands(self, src: Image, overwrite: bool) -> Self {
        Self(ValueNode::invoke(
            "Image.addBands",
            [
                ("dstImg", self.0),
                ("srcImg", src.0),
                ("overwrite", ValueNode::constant(overwrite)),
            ],
        ))
    }

    pub fn update_mask(self, mask: Image) -> Self {
        Self(ValueNode::invoke("Image.updateMask", [("image", self.0), ("mask", mask.0)]))
    }

    /// Render the first band as RGB, stretched between `min` and `max`
    pub fn visualize(self, min: f64, max: f64) -> Self {
        Self(ValueNode::invoke(
            "Image.visualize",
            [
                ("image", self.0),
                ("min", ValueNode::constant(min)),
                ("max", ValueNode::constant(max)),
            ],
        ))
    }

    pub fn classify(self, classifier: Classifier, output_name: &str) -> Self {
        Self(ValueNode::invoke(
            "Image.classify",
            [
                ("image", self.0),
                ("classifier", classifier.0),
                ("outputName", ValueNode::constant(output_name)),
            ],
        ))
    }

    /// Zonal statistic over `region` at `scale` metres
    pub fn reduce_region(self, reducer: Reducer, region: &Region, scale: f64) -> Dictionary {
        Dictionary(ValueNode::invoke(
            "Image.reduceRegion",
            [
                ("image", self.0),
                ("reducer", reducer.0),
                ("geometry", ValueNode::geometry(region)),
                ("scale", ValueNode::constant(scale)),
                ("maxPixels", ValueNode::constant(MAX_PIXELS)),
            ],
        ))
    }
}

impl ImageCollection {
    pub fn load(id: &str) -> Self {
        Self(ValueNode::invoke("ImageCollection.load", [("id", ValueNode::constant(id))]))
    }

    pub fn filter(self, filter: Filter) -> Self {
        Self(ValueNode::invoke(
            "Collection.filter",
            [("collection", self.0), ("filter", filter.0)],
        ))
    }

    /// First image of the collection; null remotely when the collection is empty
    pub fn first(self) -> Image {
        Image(ValueNode::invoke("Collection.first", [("collection", self.0)]))
    }

    /// Per-pixel, per-band mean over the collection
    pub fn mean(self) -> Image {
        Image(ValueNode::invoke("reduce.mean", [("collection", self.0)]))
    }

    /// Per-pixel, per-band sum over the collection
    pub fn sum(self) -> Image {
        Image(ValueNode::invoke("reduce.sum", [("collection", self.0)]))
    }
}

impl Filter {
    /// Keep images whose `field` (`year`, `month`, ...) lies in `[start, end]`
    pub fn calendar_range(start: i32, end: i32, field: &str) -> Self {
        Self(ValueNode::invoke(
            "Filter.calendarRange",
            [
                ("start", ValueNode::constant(start)),
                ("end", ValueNode::constant(end)),
                ("field", ValueNode::constant(field)),
            ],
        ))
    }

    pub fn year(year: i32) -> Self {
        Self::calendar_range(year, year, "year")
    }
}

impl Reducer {
    pub fn sum() -> Self {
        Self(ValueNode::invoke("Reducer.sum", []))
    }

    pub fn mean() -> Self {
        Self(ValueNode::invoke("Reducer.mean", []))
    }

    /// Group by the band at `group_field`, reporting the label as `group_name`
    pub fn group(self, group_field: u32, group_name: &str) -> Self {
        Self(ValueNode::invoke(
            "Reducer.group",
            [
                ("reducer", self.0),
                ("groupField", ValueNode::constant(group_field)),
                ("groupName", ValueNode::constant(group_name)),
            ],
        ))
    }
}

impl Classifier {
    pub fn smile_random_forest(number_of_trees: u32) -> Self {
        Self(ValueNode::invoke(
            "Classifier.smileRandomForest",
            [("numberOfTrees", ValueNode::constant(number_of_trees))],
        ))
    }

    pub fn train(
        self,
        features: FeatureCollection,
        class_property: &str,
        input_properties: &[&str],
    ) -> Self {
        Self(ValueNode::invoke(
            "Classifier.train",
            [
                ("classifier", self.0),
                ("features", features.0),
                ("classProperty", ValueNode::constant(class_property)),
                ("inputProperties", ValueNode::strings(input_properties)),
            ],
        ))
    }
}

impl FeatureCollection {
    pub fn load(table_id: &str) -> Self {
        Self(ValueNode::invoke(
            "Collection.loadTable",
            [("tableId", ValueNode::constant(table_id))],
        ))
    }
}

impl Dictionary {
    pub fn get(self, key: &str) -> ValueNode {
        ValueNode::invoke(
            "Dictionary.get",
            [("dictionary", self.0), ("key", ValueNode::constant(key))],
        )
    }
}
