//! String-keyed dispatch tables.
//!
//! Generated code frequently needs to branch on a string value - a translation key, a mod
//! identifier - without any reflective machinery. The builder here reproduces what javac
//! emits for a `switch` over strings: hash the selector, `lookupswitch` over the hash
//! values, then confirm each candidate with a real `String.equals` call so hash collisions
//! dispatch correctly.

use crate::assembly::Assembler;
use crate::classfile::{Cond, Label, MethodRef, Op, VarKind};
use crate::Result;

/// The `java.lang.String.hashCode` function, computed at assembly time.
///
/// Iterates UTF-16 code units with 31-based accumulation and wrapping arithmetic, so the
/// value here always equals what the target JVM computes for the same string at run time.
/// Keys outside the BMP hash their surrogate halves separately, exactly as Java does.
#[must_use]
pub fn java_string_hash(text: &str) -> i32 {
    text.encode_utf16()
        .fold(0i32, |hash, unit| hash.wrapping_mul(31).wrapping_add(i32::from(unit)))
}

impl Assembler {
    /// Build a string dispatch over the selector currently on top of the stack.
    ///
    /// The selector is parked in a fresh local, its `hashCode()` drives a
    /// [`Op::LookupSwitch`] whose case table is sorted by hash value, and every candidate
    /// key in a hash bucket is confirmed with `String.equals` before its arm body runs.
    /// Bucket bodies are appended in declared order, and within a colliding bucket the
    /// first declared key wins.
    ///
    /// Control reaches `no_match` when no key matches; the caller places that label.
    /// Every arm body must leave the dispatch by its own control transfer (typically a
    /// return or a `goto`); a body that falls through would run into the next bucket's
    /// equality checks.
    ///
    /// # Errors
    ///
    /// Propagates sink failures from emission.
    pub fn string_switch<F>(&mut self, no_match: Label, arms: &[(String, F)]) -> Result<&mut Self>
    where
        F: Fn(&mut Assembler) -> Result<()>,
    {
        let hash_code = MethodRef::new("java/lang/String", "hashCode", "()I")?;
        let equals = MethodRef::new("java/lang/String", "equals", "(Ljava/lang/Object;)Z")?;

        let selector = self.alloc_local(VarKind::Ref);
        self.store(VarKind::Ref, selector)?
            .load(VarKind::Ref, selector)?
            .invoke_virtual(&hash_code)?;

        // Group arms by hash value, keeping buckets in order of first appearance.
        let mut buckets: Vec<(i32, Vec<usize>)> = Vec::new();
        for (index, (key, _)) in arms.iter().enumerate() {
            let hash = java_string_hash(key);
            match buckets.iter_mut().find(|(candidate, _)| *candidate == hash) {
                Some((_, members)) => members.push(index),
                None => buckets.push((hash, vec![index])),
            }
        }

        let labeled: Vec<(i32, Label, Vec<usize>)> = buckets
            .into_iter()
            .map(|(hash, members)| (hash, self.new_label(), members))
            .collect();

        let mut cases: Vec<(i32, Label)> =
            labeled.iter().map(|(hash, label, _)| (*hash, *label)).collect();
        cases.sort_by_key(|(hash, _)| *hash);
        self.op(Op::LookupSwitch {
            cases,
            default: no_match,
        })?;

        for (_, bucket_label, members) in &labeled {
            self.label(*bucket_label)?;
            for (position, &arm_index) in members.iter().enumerate() {
                let last_in_bucket = position + 1 == members.len();
                let next_check = if last_in_bucket { no_match } else { self.new_label() };

                let (key, body) = &arms[arm_index];
                self.load(VarKind::Ref, selector)?
                    .push_str(key)?
                    .invoke_virtual(&equals)?
                    .jump_if(Cond::Eq, next_check)?;
                body(self)?;
                if !last_in_bucket {
                    self.label(next_check)?;
                }
            }
        }

        Ok(self)
    }
}
