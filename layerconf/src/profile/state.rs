//! The profile-aware configuration facade.
//!
//! [`ProfileConfig`] owns a shared [`ProfilePool`] and one materialized view:
//! the active profile merged on top of its base. Switching computes the new
//! view first and commits only on success, so a failed switch leaves the
//! facade as it was.

use std::ops::{Deref, DerefMut};
use std::sync::Arc;

use super::merger::FragmentMerger;
use super::pool::{ProfilePool, DEFAULT_PROFILE};
use crate::config::LoadOptions;
use crate::error::{Error, Result};
use crate::loader::{resolve_all, LoaderChoice, Loaders, Source};
use crate::value::{Fragment, Value};

/// Reserved key holding the pool in [`ProfileConfig::export`].
pub const POOL_KEY: &str = "__layerconf_pool__";

/// Reserved key holding the active profile and base in [`ProfileConfig::export`].
pub const META_KEY: &str = "__layerconf_meta__";

/// Where a [`ProfileConfig`] is in its lifecycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProfileState {
    /// Nothing loaded, or cleared.
    Uninitialized,
    /// The `default` profile is active.
    DefaultActive,
    /// A named profile other than `default` is active.
    ProfileActive(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Selection {
    profile: String,
    base: Option<String>,
}

/// Configuration with named profiles.
///
/// # Examples
///
/// ```
/// use layerconf::{LoadOptions, ProfileConfig, Source};
///
/// let ini = "[default]\na = @int:1\nb = @int:2\n\n[test]\na = @int:3\n";
/// let mut config =
///     ProfileConfig::load_one(Source::text(ini), Some("ini".into()), LoadOptions::default())
///         .unwrap();
/// assert_eq!(config.get("b").and_then(|v| v.as_i64()), Some(2));
///
/// config.use_profile("test", Some("default")).unwrap();
/// assert_eq!(config.get("a").and_then(|v| v.as_i64()), Some(3));
/// assert_eq!(config.get("b").and_then(|v| v.as_i64()), Some(2));
///
/// config.revert().unwrap();
/// assert_eq!(config.current_profile(), Some("default"));
/// ```
#[derive(Debug, Clone)]
pub struct ProfileConfig {
    pool: Arc<ProfilePool>,
    view: Fragment,
    active: Option<Selection>,
    previous: Option<Selection>,
    options: LoadOptions,
}

impl ProfileConfig {
    /// An uninitialized facade; add sources with [`ProfileConfig::extend`].
    #[must_use]
    pub fn new(options: LoadOptions) -> Self {
        Self {
            pool: Arc::new(ProfilePool::new()),
            view: Fragment::new(),
            active: None,
            previous: None,
            options,
        }
    }

    /// Load `sources` in profile mode and activate `default`.
    ///
    /// # Errors
    ///
    /// Returns the first resolution, read, parse or conversion error, or a
    /// profile error if the configured base is missing.
    pub fn load<I>(sources: I, loaders: Loaders, options: LoadOptions) -> Result<Self>
    where
        I: IntoIterator<Item = Source>,
    {
        let mut config = Self::new(options);
        config.extend(sources, loaders)?;
        Ok(config)
    }

    /// Load one source in profile mode and activate `default`.
    ///
    /// # Errors
    ///
    /// Same as [`ProfileConfig::load`].
    pub fn load_one(
        source: Source,
        loader: Option<LoaderChoice>,
        options: LoadOptions,
    ) -> Result<Self> {
        Self::load([source], Loaders::PerSource(vec![loader]), options)
    }

    /// Merge more sources into the pool and re-activate `default`.
    ///
    /// Nothing changes unless every source loads.
    ///
    /// # Errors
    ///
    /// Same as [`ProfileConfig::load`].
    pub fn extend<I>(&mut self, sources: I, loaders: Loaders) -> Result<()>
    where
        I: IntoIterator<Item = Source>,
    {
        let resolved = resolve_all(
            sources.into_iter().collect(),
            loaders,
            &self.options.transforms,
        )?;
        let mut pool = ProfilePool::clone(&self.pool);
        for (source, loader) in resolved {
            let origin = source.origin();
            let loaded = loader.load_with_profiles(source, self.options.ignore_missing)?;
            pool.absorb(loaded, &origin, self.options.case_sensitive);
        }
        pool.ensure_default();

        let selection = Selection {
            profile: DEFAULT_PROFILE.to_string(),
            base: self.options.base.as_deref().map(str::to_lowercase),
        };
        let view = self.compute(&pool, &selection)?;
        self.pool = Arc::new(pool);
        self.commit(view, selection);
        Ok(())
    }

    /// Switch to `profile` on top of `base`, in place.
    ///
    /// Names are lowercased. The replaced selection becomes the target of
    /// [`ProfileConfig::revert`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::NoSuchProfile`] or [`Error::NoSuchBaseProfile`]; the
    /// facade is unchanged on error.
    pub fn use_profile(&mut self, profile: &str, base: Option<&str>) -> Result<&mut Self> {
        let selection = Selection::new(profile, base);
        let view = self.compute(&self.pool, &selection)?;
        self.commit(view, selection);
        Ok(self)
    }

    /// Switch to `profile` on top of `default`, in place.
    ///
    /// # Errors
    ///
    /// Same as [`ProfileConfig::use_profile`].
    pub fn switch_to(&mut self, profile: &str) -> Result<&mut Self> {
        self.use_profile(profile, Some(DEFAULT_PROFILE))
    }

    /// A new facade on `profile`, sharing this one's pool.
    ///
    /// This facade is untouched. The copy's revert target is this facade's
    /// current selection.
    ///
    /// # Errors
    ///
    /// Same as [`ProfileConfig::use_profile`].
    pub fn use_profile_copy(&self, profile: &str, base: Option<&str>) -> Result<Self> {
        let selection = Selection::new(profile, base);
        let view = self.compute(&self.pool, &selection)?;
        Ok(Self {
            pool: Arc::clone(&self.pool),
            view,
            active: Some(selection),
            previous: self.active.clone(),
            options: self.options.clone(),
        })
    }

    /// Run `f` with `profile` active, then restore the previous state.
    ///
    /// The state is restored even if `f` panics.
    ///
    /// # Errors
    ///
    /// Same as [`ProfileConfig::use_profile`]; `f` is not run on error.
    ///
    /// # Examples
    ///
    /// ```
    /// use layerconf::{LoadOptions, ProfileConfig, Source};
    ///
    /// let dict = "{'default': {'a': 1}, 'prod': {'a': 2}}";
    /// let mut config =
    ///     ProfileConfig::load_one(Source::text(dict), Some("dict".into()), LoadOptions::default())
    ///         .unwrap();
    /// let a = config
    ///     .with_profile("prod", Some("default"), |c| c.get("a").and_then(|v| v.as_i64()))
    ///     .unwrap();
    /// assert_eq!(a, Some(2));
    /// assert_eq!(config.current_profile(), Some("default"));
    /// ```
    pub fn with_profile<R>(
        &mut self,
        profile: &str,
        base: Option<&str>,
        f: impl FnOnce(&mut Self) -> R,
    ) -> Result<R> {
        let mut guard = self.enter_profile(profile, base)?;
        Ok(f(&mut *guard))
    }

    /// Switch to `profile` until the returned guard is dropped.
    ///
    /// # Errors
    ///
    /// Same as [`ProfileConfig::use_profile`].
    pub fn enter_profile(&mut self, profile: &str, base: Option<&str>) -> Result<ProfileGuard<'_>> {
        let saved_active = self.active.clone();
        let saved_previous = self.previous.clone();
        self.use_profile(profile, base)?;
        Ok(ProfileGuard {
            config: self,
            saved_active,
            saved_previous,
        })
    }

    /// Switch back to the selection active before the current one.
    ///
    /// Does nothing if there is none. Reverting twice toggles.
    ///
    /// # Errors
    ///
    /// Same as [`ProfileConfig::use_profile`].
    pub fn revert(&mut self) -> Result<&mut Self> {
        if let Some(previous) = self.previous.clone() {
            self.use_profile(&previous.profile, previous.base.as_deref())?;
        }
        Ok(self)
    }

    /// Empty the pool and the view and forget every selection.
    pub fn clear(&mut self) {
        Arc::make_mut(&mut self.pool).clear();
        self.reset_view();
        self.previous = None;
    }

    /// The active profile.
    #[must_use]
    pub fn current_profile(&self) -> Option<&str> {
        self.active.as_ref().map(|s| s.profile.as_str())
    }

    /// The base of the active profile.
    #[must_use]
    pub fn base_profile(&self) -> Option<&str> {
        self.active.as_ref().and_then(|s| s.base.as_deref())
    }

    /// Profile names in first-seen order.
    #[must_use]
    pub fn profiles(&self) -> Vec<&str> {
        self.pool.names().collect()
    }

    /// Whether `profile` is in the pool.
    #[must_use]
    pub fn has_profile(&self, profile: &str) -> bool {
        self.pool.contains(&profile.to_lowercase())
    }

    /// The profile pool.
    #[must_use]
    pub fn pool(&self) -> &ProfilePool {
        &self.pool
    }

    /// The materialized view.
    #[must_use]
    pub const fn view(&self) -> &Fragment {
        &self.view
    }

    /// Look up a top-level key of the view.
    ///
    /// Without case sensitivity the key is upper-cased first.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        if self.options.case_sensitive {
            self.view.get(key)
        } else {
            self.view.get(&key.to_uppercase())
        }
    }

    /// Look up a top-level key of the view, falling back to `default`.
    #[must_use]
    pub fn get_or<'a>(&'a self, key: &str, default: &'a Value) -> &'a Value {
        self.get(key).unwrap_or(default)
    }

    /// An independent copy of the view without pool or metadata.
    #[must_use]
    pub fn detach(&self) -> Fragment {
        self.view.clone()
    }

    /// The view plus the pool and the active selection under reserved keys.
    #[must_use]
    pub fn export(&self) -> Fragment {
        let mut exported = self.view.clone();
        let optional = |name: Option<&str>| name.map_or(Value::Null, Value::from);
        let meta: Fragment = [
            ("current_profile".to_string(), optional(self.current_profile())),
            ("base_profile".to_string(), optional(self.base_profile())),
        ]
        .into_iter()
        .collect();
        exported.insert(POOL_KEY.to_string(), Value::Mapping(self.pool.to_fragment()));
        exported.insert(META_KEY.to_string(), Value::Mapping(meta));
        exported
    }

    /// Where the facade is in its lifecycle.
    #[must_use]
    pub fn state(&self) -> ProfileState {
        match &self.active {
            None => ProfileState::Uninitialized,
            Some(s) if s.profile == DEFAULT_PROFILE => ProfileState::DefaultActive,
            Some(s) => ProfileState::ProfileActive(s.profile.clone()),
        }
    }

    /// The options this facade loads and switches with.
    #[must_use]
    pub const fn options(&self) -> &LoadOptions {
        &self.options
    }

    /// Change options for later loads and switches.
    pub fn options_mut(&mut self) -> &mut LoadOptions {
        &mut self.options
    }

    fn compute(&self, pool: &ProfilePool, selection: &Selection) -> Result<Fragment> {
        let overlay = pool
            .get(&selection.profile)
            .ok_or_else(|| Error::NoSuchProfile {
                profile: selection.profile.clone(),
            })?;
        let mut view = Fragment::new();
        if let Some(base) = &selection.base {
            match pool.get(base) {
                Some(fragment) => FragmentMerger::merge_into(&mut view, fragment),
                None if self.options.allow_missing_base => {
                    log::debug!("base profile `{base}` missing, treated as empty");
                }
                None => return Err(Error::NoSuchBaseProfile { base: base.clone() }),
            }
        }
        FragmentMerger::merge_into(&mut view, overlay);
        Ok(view)
    }

    fn commit(&mut self, view: Fragment, selection: Selection) {
        log::debug!(
            "switching to profile `{}` (base {:?})",
            selection.profile,
            selection.base
        );
        self.view = view;
        self.previous = self.active.replace(selection);
    }

    fn reset_view(&mut self) {
        self.view = Fragment::new();
        self.active = None;
    }
}

impl Selection {
    fn new(profile: &str, base: Option<&str>) -> Self {
        Self {
            profile: profile.to_lowercase(),
            base: base.map(str::to_lowercase),
        }
    }
}

/// Restores a [`ProfileConfig`]'s selection when dropped.
///
/// Returned by [`ProfileConfig::enter_profile`]; derefs to the facade.
#[derive(Debug)]
pub struct ProfileGuard<'a> {
    config: &'a mut ProfileConfig,
    saved_active: Option<Selection>,
    saved_previous: Option<Selection>,
}

impl Deref for ProfileGuard<'_> {
    type Target = ProfileConfig;

    fn deref(&self) -> &ProfileConfig {
        self.config
    }
}

impl DerefMut for ProfileGuard<'_> {
    fn deref_mut(&mut self) -> &mut ProfileConfig {
        self.config
    }
}

impl Drop for ProfileGuard<'_> {
    fn drop(&mut self) {
        match self.saved_active.take() {
            Some(saved) => {
                if let Err(err) = self.config.use_profile(&saved.profile, saved.base.as_deref()) {
                    log::warn!("could not restore profile `{}`: {err}", saved.profile);
                    self.config.reset_view();
                }
            }
            None => self.config.reset_view(),
        }
        self.config.previous = self.saved_previous.take();
    }
}
