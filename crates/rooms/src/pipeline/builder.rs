use crate::{
    algorithms::{GeometryExtractor, RasterRoomDetector, RoomLayerCollector, VectorRoomAssembler},
    config::ExtractionConfig,
    layers::LayerClassifier,
    pipeline::Pipeline,
    reconcile::Reconciler,
    traits::RoomProducer,
};

/// Builder for creating extraction pipelines with a fluent API
pub struct PipelineBuilder {
    classifier: Option<LayerClassifier>,
    extractor: Option<GeometryExtractor>,
    room_layers: Option<Option<RoomLayerCollector>>,
    primary: Vec<Box<dyn RoomProducer>>,
    fallback: Vec<Box<dyn RoomProducer>>,
    reconciler: Option<Reconciler>,
}

impl PipelineBuilder {
    /// Create a new pipeline builder
    pub fn new() -> Self {
        Self {
            classifier: None,
            extractor: None,
            room_layers: None,
            primary: Vec::new(),
            fallback: Vec::new(),
            reconciler: None,
        }
    }

    /// Configure every stage from one configuration, with the vector
    /// assembler as primary and the raster detector as fallback producer
    pub fn with_config(self, config: &ExtractionConfig) -> Self {
        let collector = config
            .extraction
            .room_layers
            .then(|| RoomLayerCollector::new(config.extraction.min_room_layer_area));

        self.set_classifier(LayerClassifier::new(
            config.layers.rules.clone(),
            config.layers.structural.clone(),
        ))
        .set_extractor(GeometryExtractor::new(config.extraction.clone()))
        .with_room_layers(collector)
        .add_primary_producer(VectorRoomAssembler::new(config.vector.clone()))
        .add_fallback_producer(RasterRoomDetector::new(config.raster.clone(), config.simplify.clone()))
        .set_reconciler(Reconciler::new(config.reconcile.clone()))
    }

    /// Set the layer classifier (replaces any existing one)
    pub fn set_classifier(mut self, classifier: LayerClassifier) -> Self {
        self.classifier = Some(classifier);
        self
    }

    /// Set the geometry extractor (replaces any existing one)
    pub fn set_extractor(mut self, extractor: GeometryExtractor) -> Self {
        self.extractor = Some(extractor);
        self
    }

    /// Harvest room-layer outlines with the given collector, or not at all
    pub fn with_room_layers(mut self, collector: Option<RoomLayerCollector>) -> Self {
        self.room_layers = Some(collector);
        self
    }

    /// Add a producer whose rooms are always kept
    pub fn add_primary_producer<P>(mut self, producer: P) -> Self
    where
        P: RoomProducer + 'static,
    {
        self.primary.push(Box::new(producer));
        self
    }

    /// Add a producer consulted only when the primary ones find too few rooms
    pub fn add_fallback_producer<P>(mut self, producer: P) -> Self
    where
        P: RoomProducer + 'static,
    {
        self.fallback.push(Box::new(producer));
        self
    }

    /// Set the reconciler (replaces any existing one)
    pub fn set_reconciler(mut self, reconciler: Reconciler) -> Self {
        self.reconciler = Some(reconciler);
        self
    }

    /// Build the pipeline with default components if not specified
    pub fn build(self) -> Pipeline {
        let mut primary = self.primary;
        if primary.is_empty() {
            primary.push(Box::new(VectorRoomAssembler::default()));
        }
        let mut fallback = self.fallback;
        if fallback.is_empty() {
            fallback.push(Box::new(RasterRoomDetector::default()));
        }

        Pipeline::new(
            self.classifier.unwrap_or_default(),
            self.extractor.unwrap_or_default(),
            self.room_layers.unwrap_or_else(|| Some(RoomLayerCollector::default())),
            primary,
            fallback,
            self.reconciler.unwrap_or_default(),
        )
    }
}

impl Default for PipelineBuilder {
    fn default() -> Self {
        Self::new()
    }
}
