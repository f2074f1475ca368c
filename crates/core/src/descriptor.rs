//! Parameter descriptors
//!
//! A [`ParamDescriptor`] is the metadata node governing one logical position
//! in a parameter tree:
//! - type tag, oid, display names, widget hint
//! - scope (own, inherited from the nearest ancestor, or the device default)
//! - read-only and minimal-set toggles
//! - optional constraint, possibly shared with other descriptors
//! - `max_length` / `total_length`, where 0 defers to the device default
//! - named sub-descriptors for struct fields and variant alternatives
//! - an optional command handler
//!
//! Descriptors are built once with [`ParamDescriptorBuilder`] and shared via
//! `Arc`. All elements of an array param share the array's descriptor.

use crate::authz::Authorizer;
use crate::constraint::Constraint;
use crate::defaults::DeviceDefaults;
use crate::error::{Error, Result};
use crate::value::Value;
use crate::wire::{self, CommandResponse, ParamInfo, ParamType, PolyglotText};
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Command implementation
pub type CommandHandler = dyn Fn(Value) -> CommandResponse + Send + Sync;

/// Metadata for one parameter position
pub struct ParamDescriptor {
    param_type: ParamType,
    oid: RwLock<String>,
    oid_aliases: Vec<String>,
    name: PolyglotText,
    widget: String,
    scope: Option<String>,
    read_only: AtomicBool,
    minimal_set: AtomicBool,
    template_oid: String,
    constraint: Option<Arc<dyn Constraint>>,
    max_length: u32,
    total_length: u32,
    sub_params: BTreeMap<String, Arc<ParamDescriptor>>,
    is_command: bool,
    command: RwLock<Option<Arc<CommandHandler>>>,
    defaults: Arc<DeviceDefaults>,
}

impl fmt::Debug for ParamDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ParamDescriptor")
            .field("param_type", &self.param_type)
            .field("oid", &*self.oid.read())
            .field("scope", &self.scope)
            .field("read_only", &self.read_only())
            .field("max_length", &self.max_length)
            .field("total_length", &self.total_length)
            .field("sub_params", &self.sub_params.keys().collect::<Vec<_>>())
            .field("is_command", &self.is_command)
            .finish()
    }
}

impl ParamDescriptor {
    /// Start building a descriptor
    pub fn builder(param_type: ParamType, oid: impl Into<String>) -> ParamDescriptorBuilder {
        ParamDescriptorBuilder::new(param_type, oid)
    }

    /// Type tag
    pub fn param_type(&self) -> ParamType {
        self.param_type
    }

    /// Oid of this position (last path segment, not the full path)
    pub fn oid(&self) -> String {
        self.oid.read().clone()
    }

    /// Rename this position
    pub fn set_oid(&self, oid: impl Into<String>) {
        *self.oid.write() = oid.into();
    }

    /// Alternative oids
    pub fn oid_aliases(&self) -> &[String] {
        &self.oid_aliases
    }

    /// Display names
    pub fn name(&self) -> &PolyglotText {
        &self.name
    }

    /// Display name in one language
    pub fn name_in(&self, language: &str) -> Option<&str> {
        self.name.get(language)
    }

    /// Widget hint
    pub fn widget(&self) -> &str {
        &self.widget
    }

    /// Effective scope
    pub fn scope(&self) -> String {
        match &self.scope {
            Some(scope) => scope.clone(),
            None => self.defaults.scope(),
        }
    }

    /// Read-only flag
    pub fn read_only(&self) -> bool {
        self.read_only.load(Ordering::Acquire)
    }

    /// Toggle the read-only flag
    pub fn set_read_only(&self, flag: bool) {
        self.read_only.store(flag, Ordering::Release);
    }

    /// Minimal-set membership
    pub fn minimal_set(&self) -> bool {
        self.minimal_set.load(Ordering::Acquire)
    }

    /// Toggle minimal-set membership
    pub fn set_minimal_set(&self, flag: bool) {
        self.minimal_set.store(flag, Ordering::Release);
    }

    /// Template oid, empty if none
    pub fn template_oid(&self) -> &str {
        &self.template_oid
    }

    /// Constraint, if any
    pub fn constraint(&self) -> Option<&Arc<dyn Constraint>> {
        self.constraint.as_ref()
    }

    /// Maximum element count (arrays) or string length (strings)
    pub fn max_length(&self) -> usize {
        let own = if self.max_length > 0 {
            self.max_length
        } else {
            self.defaults.max_length()
        };
        own as usize
    }

    /// Maximum cumulative length of all strings in a string array
    pub fn total_length(&self) -> usize {
        let own = if self.total_length > 0 {
            self.total_length
        } else {
            self.defaults.total_length()
        };
        own as usize
    }

    /// Defaults this descriptor resolves against
    pub fn defaults(&self) -> &Arc<DeviceDefaults> {
        &self.defaults
    }

    /// Sub-descriptor for a struct field or variant alternative
    pub fn sub_param(&self, name: &str) -> Result<&Arc<ParamDescriptor>> {
        self.sub_params.get(name).ok_or_else(|| {
            Error::not_found(format!(
                "'{}' has no sub-param named '{}'",
                self.oid(),
                name
            ))
        })
    }

    /// All sub-descriptors, in name order
    pub fn sub_params(&self) -> impl Iterator<Item = (&str, &Arc<ParamDescriptor>)> {
        self.sub_params.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// True if this descriptor describes a command
    pub fn is_command(&self) -> bool {
        self.is_command
    }

    /// Install a command handler
    pub fn define_command<F>(&self, handler: F) -> Result<()>
    where
        F: Fn(Value) -> CommandResponse + Send + Sync + 'static,
    {
        if !self.is_command {
            return Err(Error::internal(format!(
                "Cannot define a command on non-command parameter '{}'",
                self.oid()
            )));
        }
        *self.command.write() = Some(Arc::new(handler));
        Ok(())
    }

    /// Run the command handler
    pub fn execute_command(&self, value: Value) -> CommandResponse {
        let handler = self.command.read().clone();
        match handler {
            Some(handler) => handler(value),
            None => CommandResponse::exception("UNIMPLEMENTED", "Command not implemented"),
        }
    }

    /// Fill metadata fields; sub-params the authorizer cannot read are left out
    pub fn to_proto(&self, dst: &mut wire::Param, authz: &dyn Authorizer) {
        dst.param_type = self.param_type;
        dst.oid_aliases = self.oid_aliases.clone();
        dst.name = self.name.clone();
        dst.widget = self.widget.clone();
        dst.read_only = self.read_only();
        dst.minimal_set = self.minimal_set();
        dst.template_oid = self.template_oid.clone();
        dst.max_length = self.max_length() as u32;
        dst.total_length = self.total_length() as u32;
        if let Some(constraint) = &self.constraint {
            if constraint.is_shared() {
                dst.constraint_ref_oid = constraint.oid().to_string();
            } else {
                dst.constraint = Some(constraint.to_proto());
            }
        }
        for (name, sub) in &self.sub_params {
            if authz.read_authz(sub) {
                let mut child = wire::Param::default();
                sub.to_proto(&mut child, authz);
                dst.params.insert(name.clone(), child);
            }
        }
    }

    /// Fill name, type and template oid of an info message
    pub fn to_info(&self, dst: &mut ParamInfo) {
        dst.param_type = self.param_type;
        dst.name = self.name.clone();
        dst.template_oid = self.template_oid.clone();
    }
}

/// Builder for [`ParamDescriptor`] trees
pub struct ParamDescriptorBuilder {
    param_type: ParamType,
    oid: String,
    oid_aliases: Vec<String>,
    name: PolyglotText,
    widget: String,
    scope: Option<String>,
    read_only: bool,
    minimal_set: bool,
    template_oid: String,
    constraint: Option<Arc<dyn Constraint>>,
    max_length: u32,
    total_length: u32,
    children: BTreeMap<String, ParamDescriptorBuilder>,
    is_command: bool,
    command: Option<Arc<CommandHandler>>,
    defaults: Option<Arc<DeviceDefaults>>,
}

impl ParamDescriptorBuilder {
    /// New builder with everything else defaulted
    pub fn new(param_type: ParamType, oid: impl Into<String>) -> Self {
        ParamDescriptorBuilder {
            param_type,
            oid: oid.into(),
            oid_aliases: Vec::new(),
            name: PolyglotText::default(),
            widget: String::new(),
            scope: None,
            read_only: false,
            minimal_set: false,
            template_oid: String::new(),
            constraint: None,
            max_length: 0,
            total_length: 0,
            children: BTreeMap::new(),
            is_command: false,
            command: None,
            defaults: None,
        }
    }

    /// Type tag set so far
    pub fn get_param_type(&self) -> ParamType {
        self.param_type
    }

    /// Oid set so far
    pub fn get_oid(&self) -> &str {
        &self.oid
    }

    /// Replace the type tag
    pub fn param_type(mut self, param_type: ParamType) -> Self {
        self.param_type = param_type;
        self
    }

    /// Add a display name
    pub fn name(mut self, language: impl Into<String>, text: impl Into<String>) -> Self {
        self.name
            .display_strings
            .insert(language.into(), text.into());
        self
    }

    /// Add an oid alias
    pub fn oid_alias(mut self, alias: impl Into<String>) -> Self {
        self.oid_aliases.push(alias.into());
        self
    }

    /// Widget hint
    pub fn widget(mut self, widget: impl Into<String>) -> Self {
        self.widget = widget.into();
        self
    }

    /// Own scope; children without one inherit it
    pub fn scope(mut self, scope: impl Into<String>) -> Self {
        self.scope = Some(scope.into());
        self
    }

    /// Read-only flag
    pub fn read_only(mut self, flag: bool) -> Self {
        self.read_only = flag;
        self
    }

    /// Minimal-set membership
    pub fn minimal_set(mut self, flag: bool) -> Self {
        self.minimal_set = flag;
        self
    }

    /// Template oid
    pub fn template_oid(mut self, oid: impl Into<String>) -> Self {
        self.template_oid = oid.into();
        self
    }

    /// Attach a constraint
    pub fn constraint(mut self, constraint: Arc<dyn Constraint>) -> Self {
        self.constraint = Some(constraint);
        self
    }

    /// Maximum element count or string length; 0 defers to the device
    pub fn max_length(mut self, max_length: u32) -> Self {
        self.max_length = max_length;
        self
    }

    /// Maximum cumulative string length; 0 defers to the device
    pub fn total_length(mut self, total_length: u32) -> Self {
        self.total_length = total_length;
        self
    }

    /// Mark as a command with the given handler
    pub fn command<F>(mut self, handler: F) -> Self
    where
        F: Fn(Value) -> CommandResponse + Send + Sync + 'static,
    {
        self.is_command = true;
        self.command = Some(Arc::new(handler));
        self
    }

    /// Mark as a command without a handler yet
    pub fn is_command(mut self, flag: bool) -> Self {
        self.is_command = flag;
        self
    }

    /// Defaults to resolve lengths and scope against
    pub fn defaults(mut self, defaults: Arc<DeviceDefaults>) -> Self {
        self.defaults = Some(defaults);
        self
    }

    /// Add a sub-descriptor keyed by its oid, replacing any previous one
    pub fn sub_param(mut self, child: ParamDescriptorBuilder) -> Self {
        self.children.insert(child.oid.clone(), child);
        self
    }

    /// Edit the sub-descriptor `name`, creating an undefined one if absent
    pub fn sub_param_with<F>(mut self, name: &str, f: F) -> Self
    where
        F: FnOnce(ParamDescriptorBuilder) -> ParamDescriptorBuilder,
    {
        let child = self
            .children
            .remove(name)
            .unwrap_or_else(|| ParamDescriptorBuilder::new(ParamType::Undefined, name));
        self.children.insert(name.to_string(), f(child));
        self
    }

    /// True if a sub-descriptor `name` was added
    pub fn has_sub_param(&self, name: &str) -> bool {
        self.children.contains_key(name)
    }

    /// Finish the tree
    pub fn build(self) -> Arc<ParamDescriptor> {
        let defaults = self.defaults.clone().unwrap_or_else(DeviceDefaults::shared);
        Arc::new(self.build_inner(None, &defaults))
    }

    fn build_inner(self, inherited: Option<&str>, defaults: &Arc<DeviceDefaults>) -> ParamDescriptor {
        let scope = self.scope.or_else(|| inherited.map(str::to_string));
        let sub_params = self
            .children
            .into_iter()
            .map(|(name, child)| {
                let built = child.build_inner(scope.as_deref(), defaults);
                (name, Arc::new(built))
            })
            .collect();
        ParamDescriptor {
            param_type: self.param_type,
            oid: RwLock::new(self.oid),
            oid_aliases: self.oid_aliases,
            name: self.name,
            widget: self.widget,
            scope,
            read_only: AtomicBool::new(self.read_only),
            minimal_set: AtomicBool::new(self.minimal_set),
            template_oid: self.template_oid,
            constraint: self.constraint,
            max_length: self.max_length,
            total_length: self.total_length,
            sub_params,
            is_command: self.is_command,
            command: RwLock::new(self.command),
            defaults: Arc::clone(defaults),
        }
    }
}
