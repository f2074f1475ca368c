//! Array values
//!
//! Every array param is a `Vec<E>` where `E` implements [`Element`]. All
//! elements share the array's descriptor.
//!
//! Length budgets are enforced during validation only:
//! - `max_length` bounds the element count
//! - `total_length` bounds the summed byte length of a string array
//!
//! Indexed writes are tracked in the [`SetValueTransaction`] so several
//! appends in one request are checked against the pending length.

use crate::transaction::{SetValueTransaction, SizeTracker};
use crate::value::{mismatch, require_read, require_write, too_long, Node, ParamValue};
use catena_core::{
    Authorizer, Error, Index, ParamDescriptor, ParamDescriptorBuilder, ParamType, Path, Result,
    Segment, Value,
};
use std::sync::Arc;

/// A value that can be stored in an array param
pub trait Element: ParamValue + Default + 'static {
    /// Type tag of `Vec<Self>`
    const ARRAY_TYPE: ParamType;
    /// True if elements have addressable sub-params
    const COMPOSITE: bool = false;
    /// True if the array's `total_length` budget applies
    const TRACKS_LENGTH: bool = false;

    /// Wrap per-element wire values in the array variant
    fn pack(items: Vec<Value>) -> Value;

    /// Split the array variant into per-element wire values
    fn unpack(src: &Value) -> Option<Vec<Value>>;

    /// Build an element from its wire form; `None` drops it
    fn decode(src: &Value, desc: &ParamDescriptor, authz: &dyn Authorizer) -> Option<Self> {
        let mut elem = Self::default();
        elem.from_wire(src, desc, authz);
        Some(elem)
    }

    /// False if [`decode`](Self::decode) would drop `src`
    fn accepts(_src: &Value, _desc: &ParamDescriptor) -> bool {
        true
    }

    /// Validate one element's wire form
    ///
    /// `current` is the element being overwritten, if it already exists.
    fn check_element(
        current: Option<&Self>,
        src: &Value,
        desc: &ParamDescriptor,
        oid: &str,
        authz: &dyn Authorizer,
        txn: &mut SetValueTransaction,
    ) -> Result<()>;

    /// Length counted against `total_length` for an incoming element
    fn wire_len(_src: &Value) -> usize {
        0
    }

    /// Length counted against `total_length` for a stored element
    fn native_len(&self) -> usize {
        0
    }
}

fn tracker_of<E: Element>(items: &[E]) -> SizeTracker {
    if E::TRACKS_LENGTH {
        SizeTracker::with_lengths(items.iter().map(E::native_len).collect())
    } else {
        SizeTracker::counted(items.len())
    }
}

fn index_out_of_range(desc: &ParamDescriptor, index: usize, len: usize) -> Error {
    Error::out_of_range(format!(
        "index {} is out of range for '{}' of length {}",
        index,
        desc.oid(),
        len
    ))
}

fn check_budget<E: Element>(desc: &ParamDescriptor, tracker: &SizeTracker) -> Result<()> {
    let max = desc.max_length();
    if tracker.count > max {
        return Err(too_long(desc, "array length", tracker.count, max));
    }
    if E::TRACKS_LENGTH {
        let total = tracker.total_length();
        let limit = desc.total_length();
        if total > limit {
            return Err(too_long(desc, "total length", total, limit));
        }
    }
    Ok(())
}

impl<E: Element> ParamValue for Vec<E> {
    fn param_type(&self) -> ParamType {
        E::ARRAY_TYPE
    }

    fn size(&self) -> usize {
        self.len()
    }

    fn to_wire(&self, desc: &ParamDescriptor, authz: &dyn Authorizer) -> Value {
        E::pack(self.iter().map(|e| e.to_wire(desc, authz)).collect())
    }

    fn from_wire(&mut self, src: &Value, desc: &ParamDescriptor, authz: &dyn Authorizer) {
        let Some(items) = E::unpack(src) else {
            return;
        };
        *self = items
            .iter()
            .filter_map(|item| E::decode(item, desc, authz))
            .collect();
    }

    fn get_param<'a>(
        &'a mut self,
        path: &mut Path,
        desc: &Arc<ParamDescriptor>,
        authz: &dyn Authorizer,
    ) -> Result<Node<'a>> {
        require_read(desc, authz)?;
        let index = match path.front() {
            Some(Segment::Index(Index::At(i))) => *i,
            Some(Segment::Index(Index::End)) => {
                return Err(Error::out_of_range(format!(
                    "'-' does not name an element of '{}'",
                    desc.oid()
                )))
            }
            Some(Segment::Name(name)) => {
                return Err(Error::invalid_argument(format!(
                    "'{}' is an array and expects an index, got '{}'",
                    desc.oid(),
                    name
                )))
            }
            None => {
                return Err(Error::invalid_argument(format!(
                    "empty path below '{}'",
                    desc.oid()
                )))
            }
        };

        let len = self.len();
        let Some(elem) = self.get_mut(index) else {
            return Err(index_out_of_range(desc, index, len));
        };
        path.pop();
        if path.is_empty() {
            return Ok(Node {
                value: elem,
                descriptor: Arc::clone(desc),
            });
        }
        if !E::COMPOSITE {
            return Err(Error::not_found(format!(
                "element {} of '{}' has no sub-params (path '{}')",
                index,
                desc.oid(),
                path.remaining()
            )));
        }
        elem.get_param(path, desc, authz)
    }

    fn add_back(&mut self, desc: &ParamDescriptor, authz: &dyn Authorizer) -> Result<usize> {
        require_write(desc, authz)?;
        let max = desc.max_length();
        if self.len() >= max {
            return Err(too_long(desc, "array length", self.len() + 1, max));
        }
        self.push(E::default());
        Ok(self.len() - 1)
    }

    fn pop_back(&mut self, desc: &ParamDescriptor, authz: &dyn Authorizer) -> Result<()> {
        require_write(desc, authz)?;
        match self.pop() {
            Some(_) => Ok(()),
            None => Err(Error::out_of_range(format!(
                "cannot pop from empty array '{}'",
                desc.oid()
            ))),
        }
    }

    fn check_set_value(
        &self,
        src: &Value,
        index: Option<Index>,
        desc: &ParamDescriptor,
        oid: &str,
        authz: &dyn Authorizer,
        txn: &mut SetValueTransaction,
    ) -> Result<()> {
        require_write(desc, authz)?;

        let Some(index) = index else {
            let Some(items) = E::unpack(src) else {
                return Err(mismatch(desc, &E::ARRAY_TYPE.to_string(), src));
            };
            let tracker = if E::TRACKS_LENGTH {
                SizeTracker::with_lengths(items.iter().map(E::wire_len).collect())
            } else {
                SizeTracker::counted(items.len())
            };
            check_budget::<E>(desc, &tracker)?;
            for (i, item) in items.iter().enumerate() {
                E::check_element(self.get(i), item, desc, &format!("{}/{}", oid, i), authz, txn)?;
            }
            txn.commit(oid, tracker);
            return Ok(());
        };

        let mut tracker = txn.pending(oid, || tracker_of(self));
        let position = match index {
            Index::At(i) if i >= tracker.count => {
                return Err(index_out_of_range(desc, i, tracker.count))
            }
            Index::At(i) => i,
            Index::End => tracker.count,
        };
        E::check_element(
            self.get(position),
            src,
            desc,
            &format!("{}/{}", oid, position),
            authz,
            txn,
        )?;
        // a value the constraint drops leaves the array as it is
        if !E::accepts(src, desc) {
            return Ok(());
        }

        let len = E::wire_len(src);
        match index {
            Index::End => {
                tracker.count += 1;
                if let Some(lengths) = tracker.lengths.as_mut() {
                    lengths.push(len);
                }
            }
            Index::At(i) => {
                if let Some(slot) = tracker.lengths.as_mut().and_then(|l| l.get_mut(i)) {
                    *slot = len;
                }
            }
        }
        check_budget::<E>(desc, &tracker)?;
        txn.commit(oid, tracker);
        Ok(())
    }

    fn apply_set_value(
        &mut self,
        src: &Value,
        index: Option<Index>,
        desc: &ParamDescriptor,
        authz: &dyn Authorizer,
    ) -> Result<()> {
        match index {
            None => self.from_wire(src, desc, authz),
            Some(Index::End) => {
                if let Some(elem) = E::decode(src, desc, authz) {
                    self.push(elem);
                }
            }
            Some(Index::At(i)) => {
                let len = self.len();
                let elem = self
                    .get_mut(i)
                    .ok_or_else(|| index_out_of_range(desc, i, len))?;
                elem.from_wire(src, desc, authz);
            }
        }
        Ok(())
    }

    fn check_layout(&self, desc: &ParamDescriptor) -> Result<()> {
        E::default().check_layout(desc)
    }

    fn describe(&self, builder: ParamDescriptorBuilder) -> ParamDescriptorBuilder {
        E::default().describe(builder)
    }
}
