use std::collections::HashMap;

use crate::error::{
    JenkinsError,
    JenkinsResult,
};
use crate::model::{
    Job,
    View,
};
use crate::plugin::{
    GenericJob,
    GenericView,
    JobPlugin,
    JobPluginType,
    Namespace,
    PluginMetadata,
    ViewPlugin,
    ViewPluginType,
    XmlPlugin,
    XmlPluginType,
};
use crate::xml::XmlNode;

type ViewFactory = fn(View) -> Box<dyn ViewPlugin>;
type JobFactory = fn(Job) -> Box<dyn JobPlugin>;
type FragmentFactory = fn(XmlNode) -> JenkinsResult<Box<dyn XmlPlugin>>;
type TemplateFn = fn() -> Option<String>;

#[derive(Debug)]
struct Entry<F> {
    metadata: PluginMetadata,
    factory: F,
    template: TemplateFn,
}

/// One namespace worth of descriptors, indexed by qualified name and by alias
#[derive(Debug)]
struct Table<F> {
    entries: Vec<Entry<F>>,
    qualified: HashMap<&'static str, usize>,
    aliases: HashMap<String, usize>,
}

impl<F> Default for Table<F> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
            qualified: HashMap::new(),
            aliases: HashMap::new(),
        }
    }
}

impl<F> Table<F> {
    fn insert(
        &mut self, metadata: PluginMetadata, factory: F, template: TemplateFn,
    ) -> JenkinsResult<()> {
        let namespace = metadata.namespace;
        let clash = std::iter::once(metadata.type_token)
            .chain(metadata.aliases.iter().copied())
            .find(|token| self.contains(token));
        if let Some(token) = clash {
            return Err(JenkinsError::DuplicatePlugin {
                namespace,
                token: token.to_string(),
            });
        }

        let idx = self.entries.len();
        self.qualified.insert(metadata.type_token, idx);
        for alias in metadata.aliases {
            self.aliases.insert(alias.to_ascii_lowercase(), idx);
        }
        self.entries.push(Entry {
            metadata,
            factory,
            template,
        });
        Ok(())
    }

    fn contains(&self, token: &str) -> bool {
        self.qualified.contains_key(token)
            || self.aliases.contains_key(&token.to_ascii_lowercase())
    }

    /// Qualified names across all candidates win over any alias match
    fn lookup(&self, candidates: &[&str]) -> Option<&Entry<F>> {
        candidates
            .iter()
            .find_map(|c| self.qualified.get(c))
            .or_else(|| {
                candidates
                    .iter()
                    .find_map(|c| self.aliases.get(&c.to_ascii_lowercase()))
            })
            .map(|&idx| &self.entries[idx])
    }

    fn tokens(&self) -> Vec<&'static str> {
        let mut tokens: Vec<_> = self.entries.iter().map(|e| e.metadata.type_token).collect();
        tokens.sort_unstable();
        tokens
    }
}

fn make_view<T: ViewPluginType>(view: View) -> Box<dyn ViewPlugin> {
    Box::new(T::from_view(view))
}

fn make_job<T: JobPluginType>(job: Job) -> Box<dyn JobPlugin> {
    Box::new(T::from_job(job))
}

fn make_fragment<T: XmlPluginType>(node: XmlNode) -> JenkinsResult<Box<dyn XmlPlugin>> {
    Ok(Box::new(T::from_node(node)?))
}

fn no_template() -> Option<String> {
    None
}

/// Static table of (namespace, token, factory) tuples.
///
/// Populated once at startup by each plugin crate's `register` function and
/// then shared read-only behind an `Arc` by every resource handle.
#[derive(Debug, Default)]
pub struct PluginRegistry {
    views: Table<ViewFactory>,
    jobs: Table<JobFactory>,
    fragments: HashMap<Namespace, Table<FragmentFactory>>,
}

impl PluginRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_view<T: ViewPluginType>(&mut self) -> JenkinsResult<()> {
        let metadata = expect_namespace(T::metadata(), |ns| ns == Namespace::View)?;
        self.views.insert(metadata, make_view::<T>, no_template)
    }

    pub fn register_job<T: JobPluginType>(&mut self) -> JenkinsResult<()> {
        let metadata = expect_namespace(T::metadata(), |ns| ns == Namespace::Job)?;
        self.jobs
            .insert(metadata, make_job::<T>, T::template_config_xml)
    }

    pub fn register_fragment<T: XmlPluginType>(&mut self) -> JenkinsResult<()> {
        let metadata = expect_namespace(T::metadata(), |ns| ns.is_fragment())?;
        self.fragments
            .entry(metadata.namespace)
            .or_default()
            .insert(metadata, make_fragment::<T>, T::template_xml)
    }

    /// Wraps `view` in its registered type, or a [`GenericView`] when unknown
    pub fn resolve_view(&self, token: &str, view: View) -> Box<dyn ViewPlugin> {
        match self.views.lookup(&[token]) {
            Some(entry) => (entry.factory)(view),
            None => {
                tracing::warn!(
                    token,
                    url = view.url(),
                    "No view plugin registered, using generic view"
                );
                Box::new(GenericView::new(view, token))
            }
        }
    }

    /// Wraps `job` in its registered type, or a [`GenericJob`] when unknown
    pub fn resolve_job(&self, token: &str, job: Job) -> Box<dyn JobPlugin> {
        match self.jobs.lookup(&[token]) {
            Some(entry) => (entry.factory)(job),
            None => {
                tracing::warn!(
                    token,
                    url = job.url(),
                    "No job plugin registered, using generic job"
                );
                Box::new(GenericJob::new(job, token))
            }
        }
    }

    /// Resolves an embedded fragment; unknown types are an error, never a fallback.
    ///
    /// Candidates are the `class` attribute, the element tag, and the short
    /// name from a `plugin="name@version"` attribute.
    pub fn resolve_fragment(
        &self, namespace: Namespace, node: &XmlNode,
    ) -> JenkinsResult<Box<dyn XmlPlugin>> {
        let mut candidates = vec![node.type_token(), node.tag()];
        if let Some(short) = node.plugin_short_name() {
            candidates.push(short);
        }

        let entry = self
            .fragments
            .get(&namespace)
            .and_then(|table| table.lookup(&candidates))
            .ok_or_else(|| JenkinsError::unsupported(namespace, node.type_token()))?;

        (entry.factory)(node.clone())
    }

    /// Metadata for a token (qualified or alias) in a namespace
    pub fn descriptor(&self, namespace: Namespace, token: &str) -> Option<&PluginMetadata> {
        match namespace {
            Namespace::View => self.views.lookup(&[token]).map(|e| &e.metadata),
            Namespace::Job => self.jobs.lookup(&[token]).map(|e| &e.metadata),
            ns => self
                .fragments
                .get(&ns)
                .and_then(|t| t.lookup(&[token]))
                .map(|e| &e.metadata),
        }
    }

    /// Maps an alias to its fully qualified type token
    pub fn canonical_token(&self, namespace: Namespace, token: &str) -> Option<&'static str> {
        self.descriptor(namespace, token).map(|m| m.type_token)
    }

    pub fn is_registered(&self, namespace: Namespace, token: &str) -> bool {
        self.descriptor(namespace, token).is_some()
    }

    /// Sorted fully qualified tokens registered in a namespace
    pub fn supported_types(&self, namespace: Namespace) -> Vec<&'static str> {
        match namespace {
            Namespace::View => self.views.tokens(),
            Namespace::Job => self.jobs.tokens(),
            ns => self
                .fragments
                .get(&ns)
                .map(Table::tokens)
                .unwrap_or_default(),
        }
    }

    /// Default XML a plugin produces for new instances of its type
    pub fn template_xml(&self, namespace: Namespace, token: &str) -> JenkinsResult<String> {
        let template = match namespace {
            Namespace::View => self.views.lookup(&[token]).map(|e| e.template),
            Namespace::Job => self.jobs.lookup(&[token]).map(|e| e.template),
            ns => self
                .fragments
                .get(&ns)
                .and_then(|t| t.lookup(&[token]))
                .map(|e| e.template),
        };

        template
            .and_then(|f| f())
            .ok_or_else(|| JenkinsError::unsupported(namespace, token))
    }

    pub fn count(&self) -> usize {
        self.views.entries.len()
            + self.jobs.entries.len()
            + self
                .fragments
                .values()
                .map(|t| t.entries.len())
                .sum::<usize>()
    }
}

fn expect_namespace(
    metadata: PluginMetadata, ok: impl Fn(Namespace) -> bool,
) -> JenkinsResult<PluginMetadata> {
    if ok(metadata.namespace) {
        Ok(metadata)
    } else {
        Err(JenkinsError::InvalidConfig(format!(
            "plugin '{}' declares namespace '{}' which does not match its kind",
            metadata.type_token, metadata.namespace
        )))
    }
}
