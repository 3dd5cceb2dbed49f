use geo::Geometry;
use serde_json::{Map, Value};

/// A point (or small geometry) to be labelled with the region enclosing it.
#[derive(Debug, Clone)]
pub struct PointFeature {
    pub geometry: Geometry<f64>,
    pub properties: Map<String, Value>,
    pub region_label: Option<String>, // Unset until joined
}

impl PointFeature {
    pub fn new(geometry: Geometry<f64>) -> Self {
        Self { geometry, properties: Map::new(), region_label: None }
    }

    pub fn with_properties(mut self, properties: Map<String, Value>) -> Self {
        self.properties = properties;
        self
    }
}

/// A named collection of point features (e.g. "hospitals").
/// A feature's identity is its position in the collection.
#[derive(Debug, Clone)]
pub struct PointLayer {
    name: String,
    features: Vec<PointFeature>,
    epsg: Option<u32>,
}

impl PointLayer {
    pub fn new(name: &str, features: Vec<PointFeature>) -> Self {
        Self { name: name.to_string(), features, epsg: None }
    }

    pub fn with_epsg(mut self, epsg: Option<u32>) -> Self {
        self.epsg = epsg;
        self
    }

    #[inline] pub fn name(&self) -> &str { &self.name }

    #[inline] pub fn features(&self) -> &[PointFeature] { &self.features }

    #[inline] pub fn len(&self) -> usize { self.features.len() }

    #[inline] pub fn is_empty(&self) -> bool { self.features.is_empty() }

    #[inline] pub fn epsg(&self) -> Option<u32> { self.epsg }

    pub(crate) fn into_features(self) -> (String, Vec<PointFeature>, Option<u32>) {
        (self.name, self.features, self.epsg)
    }
}
