use crate::backend::RenderBackend;
use crate::clock::Clock;
use crate::composite::{CompositeLoop, FrameReport};
use crate::error::RenderError;
use crate::target::ResizePolicy;
use endless_common::Viewport;
use endless_params::{ParamStore, Watcher, names};
use endless_text::{DEFAULT_FONT, FontLoader, FontRegistry, SyncOutcome, TextMeshProvider, TextRequest};

/// Mount-time options.
#[derive(Debug, Clone, PartialEq)]
pub struct SketchOptions {
    /// The word rendered into the off-screen target.
    pub text: String,
    pub resize: ResizePolicy,
    /// Also draw the text in the visible pass.
    pub show_text: bool,
}

impl Default for SketchOptions {
    fn default() -> Self {
        Self {
            text: "ENDLESS".into(),
            resize: ResizePolicy::default(),
            show_text: false,
        }
    }
}

/// The whole sketch: parameter surface, text mesh and composite loop.
///
/// Hosts call [`Sketch::frame`] once per display refresh and mutate
/// [`Sketch::params_mut`] from their controls in between.
pub struct Sketch<C: Clock, L: FontLoader> {
    params: ParamStore,
    watcher: Watcher,
    text: TextMeshProvider<L>,
    composite: CompositeLoop<C>,
    options: SketchOptions,
    text_error: Option<String>,
}

impl<C: Clock, L: FontLoader> Sketch<C, L> {
    /// Build the scenes and the initial text mesh.
    ///
    /// Fails if the default font is not registered or cannot be loaded.
    pub fn mount(
        clock: C,
        loader: L,
        registry: FontRegistry,
        viewport: Viewport,
        options: SketchOptions,
    ) -> Result<Self, RenderError> {
        let params = ParamStore::with_defaults(registry.names(), DEFAULT_FONT)?;
        let mut composite = CompositeLoop::new(clock, viewport, options.resize);
        let mut text = TextMeshProvider::new(registry, loader);

        let request = TextRequest::from_params(&options.text, &params)?;
        let mesh = text.sync(&request, composite.arena_mut())?.mesh();
        composite.attach_shared(mesh, options.show_text);
        composite.validate()?;

        let watcher = params.watch();
        Ok(Self {
            params,
            watcher,
            text,
            composite,
            options,
            text_error: None,
        })
    }

    pub fn params(&self) -> &ParamStore {
        &self.params
    }

    pub fn params_mut(&mut self) -> &mut ParamStore {
        &mut self.params
    }

    pub fn composite(&self) -> &CompositeLoop<C> {
        &self.composite
    }

    pub fn text(&self) -> &TextMeshProvider<L> {
        &self.text
    }

    pub fn options(&self) -> &SketchOptions {
        &self.options
    }

    /// The last text update failure, cleared by the next success.
    pub fn text_error(&self) -> Option<&str> {
        self.text_error.as_deref()
    }

    /// Bring the text mesh in line with the current parameters.
    pub fn sync_text(&mut self) -> Result<SyncOutcome, RenderError> {
        let request = TextRequest::from_params(&self.options.text, &self.params)?;
        let outcome = self.text.sync(&request, self.composite.arena_mut())?;
        if let SyncOutcome::Created(id) = outcome {
            self.composite.attach_shared(id, self.options.show_text);
        }
        Ok(outcome)
    }

    pub fn resize(&mut self, viewport: Viewport) -> bool {
        self.composite.resize(viewport)
    }

    /// Apply parameter changes since the last frame, then render.
    ///
    /// A failed text update is logged once and the last good mesh keeps
    /// rendering.
    pub fn frame<B: RenderBackend>(&mut self, backend: &mut B) -> Result<FrameReport, RenderError> {
        if self.watcher.is_dirty(&self.params) {
            let changed = self.watcher.poll(&self.params);
            let text_inputs = [names::FONT, names::FONT_SIZE, names::FONT_WIDTH];
            if changed.iter().any(|n| text_inputs.contains(&n.as_str())) {
                match self.sync_text() {
                    Ok(outcome) => {
                        tracing::debug!("text sync: {:?}", outcome);
                        self.text_error = None;
                    }
                    Err(e) => {
                        tracing::error!("text update failed, keeping previous mesh: {e}");
                        self.text_error = Some(e.to_string());
                    }
                }
            }
        }
        self.composite.frame(backend, &self.params)
    }
}
