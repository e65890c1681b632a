//! `Range` and `Range::Enumerator`.
//!
//! A range holds two arbitrary endpoint values and an exclusivity flag. It
//! knows nothing about the endpoints' type: enumeration works for any value
//! that responds to `succ` and to the comparison selector chosen when the
//! enumerator is created (`<` for exclusive ranges, `<=` otherwise).
//!
//! An enumerator moves through three states:
//!
//! ```text
//! Before --next--> Iterating --next (out of range)--> Done
//! ```
//!
//! Before every `current` and `next` the cursor is probed with
//! `responds_to`; a cursor lacking either selector raises `TypeError`
//! ("Uniterable type in range"). `current` outside `Iterating` raises
//! `TypeError` ("Invalid operation on Range::Enumerator").

use sable_mem::Symbol;

use crate::error::{Error, Result};
use crate::runtime::method::Arity;
use crate::runtime::object::Payload;
use crate::runtime::symbols;
use crate::runtime::value::{ObjectRef, Value};
use crate::runtime::vm::Vm;

/// Endpoints of a `Range`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RangeData {
    pub left: Value,
    pub right: Value,
    pub exclusive: bool,
}

/// Comparison an enumerator applies between its cursor and the right bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparator {
    /// `<`, for exclusive ranges.
    Lt,
    /// `<=`, for inclusive ranges.
    Lte,
}

impl Comparator {
    #[must_use]
    pub const fn for_range(exclusive: bool) -> Self {
        if exclusive { Comparator::Lt } else { Comparator::Lte }
    }

    /// Selector sent to the cursor.
    #[must_use]
    pub const fn selector(self) -> Symbol {
        match self {
            Comparator::Lt => symbols::OP_LT,
            Comparator::Lte => symbols::OP_LTE,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnumeratorState {
    Before,
    Iterating,
    Done,
}

/// Cursor of a `Range::Enumerator`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EnumeratorData {
    pub current: Value,
    pub right: Value,
    pub comparator: Comparator,
    pub state: EnumeratorState,
}

pub(crate) fn allocate_range(_vm: &mut Vm) -> Payload {
    Payload::Range(RangeData {
        left: Value::Nil,
        right: Value::Nil,
        exclusive: false,
    })
}

pub(crate) fn allocate_range_enumerator(_vm: &mut Vm) -> Payload {
    Payload::RangeEnumerator(EnumeratorData {
        current: Value::Nil,
        right: Value::Nil,
        comparator: Comparator::Lte,
        state: EnumeratorState::Done,
    })
}

fn payload_mismatch(vm: &mut Vm, value: Value, kind: &str) -> Error {
    let message = format!("{} is not a {kind}", vm.describe(value));
    vm.raise(vm.core().type_error, message)
}

fn range_ref(vm: &mut Vm, value: Value) -> Result<(ObjectRef, RangeData)> {
    let range = vm.core().range;
    vm.expect(value, range)?;
    let data = match vm.payload(value) {
        Some(Payload::Range(data)) => Some(*data),
        _ => None,
    };
    match (value, data) {
        (Value::Ref(r), Some(data)) => Ok((r, data)),
        _ => Err(payload_mismatch(vm, value, "Range")),
    }
}

fn get_range(vm: &mut Vm, value: Value) -> Result<RangeData> {
    range_ref(vm, value).map(|(_, data)| data)
}

fn set_range(vm: &mut Vm, value: Value, data: RangeData) -> Result<()> {
    let (r, _) = range_ref(vm, value)?;
    *vm.object_mut(r)?.payload_mut() = Payload::Range(data);
    Ok(())
}

fn get_enumerator(vm: &mut Vm, value: Value) -> Result<EnumeratorData> {
    let class = vm.core().range_enumerator;
    vm.expect(value, class)?;
    let data = match vm.payload(value) {
        Some(Payload::RangeEnumerator(data)) => Some(*data),
        _ => None,
    };
    data.ok_or_else(|| payload_mismatch(vm, value, "Range::Enumerator"))
}

fn set_enumerator(vm: &mut Vm, value: Value, data: EnumeratorData) -> Result<()> {
    if let Value::Ref(r) = value {
        *vm.object_mut(r)?.payload_mut() = Payload::RangeEnumerator(data);
    }
    Ok(())
}

fn check_enumerator(vm: &mut Vm, data: &EnumeratorData) -> Result<()> {
    if vm.responds_to_id(data.current, symbols::SUCC)
        && vm.responds_to_id(data.current, data.comparator.selector())
    {
        return Ok(());
    }
    Err(vm.raise(vm.core().type_error, "Uniterable type in range"))
}

/// Makes the inclusive range `lower..upper`.
pub fn make_range(vm: &mut Vm, lower: Value, upper: Value) -> Value {
    new_range(vm, lower, upper, false)
}

/// Makes the exclusive range `lower...upper`.
pub fn make_range_exclusive(vm: &mut Vm, lower: Value, upper: Value) -> Value {
    new_range(vm, lower, upper, true)
}

fn new_range(vm: &mut Vm, left: Value, right: Value, exclusive: bool) -> Value {
    let class = vm.core().range;
    let value = vm.instantiate(class);
    if let Some(object) = value.as_object().and_then(|r| vm.object_mut(r).ok()) {
        *object.payload_mut() = Payload::Range(RangeData {
            left,
            right,
            exclusive,
        });
    }
    value
}

/// Left endpoint.
///
/// # Errors
///
/// `TypeError` if `range` is not a `Range`.
pub fn range_lower(vm: &mut Vm, range: Value) -> Result<Value> {
    get_range(vm, range).map(|data| data.left)
}

/// Right endpoint.
///
/// # Errors
///
/// `TypeError` if `range` is not a `Range`.
pub fn range_upper(vm: &mut Vm, range: Value) -> Result<Value> {
    get_range(vm, range).map(|data| data.right)
}

/// # Errors
///
/// `TypeError` if `range` is not a `Range`.
pub fn range_is_exclusive(vm: &mut Vm, range: Value) -> Result<bool> {
    get_range(vm, range).map(|data| data.exclusive)
}

pub(crate) fn init(vm: &mut Vm) {
    let core = *vm.core();

    vm.define_method(core.range, "init", Arity::from_encoded(-3), range_init);
    vm.define_method(core.range, "enumerate", Arity::Fixed(0), range_enumerate);
    vm.define_method(core.range, "lower", Arity::Fixed(0), |vm, this, _| {
        range_lower(vm, this)
    });
    vm.define_method(core.range, "upper", Arity::Fixed(0), |vm, this, _| {
        range_upper(vm, this)
    });

    vm.define_method(
        core.range_enumerator,
        "current",
        Arity::Fixed(0),
        enumerator_current,
    );
    vm.define_method(core.range_enumerator, "next", Arity::Fixed(0), enumerator_next);
}

fn range_init(vm: &mut Vm, this: Value, args: &[Value]) -> Result<Value> {
    if args.len() > 3 {
        return Err(vm.arity_error(args.len(), "2..3"));
    }
    let data = RangeData {
        left: args[0],
        right: args[1],
        exclusive: args.get(2).is_some_and(|v| v.is_truthy()),
    };
    set_range(vm, this, data)?;
    Ok(this)
}

fn range_enumerate(vm: &mut Vm, this: Value, _args: &[Value]) -> Result<Value> {
    let range = get_range(vm, this)?;
    let class = vm.core().range_enumerator;
    let enumerator = vm.instantiate(class);
    set_enumerator(
        vm,
        enumerator,
        EnumeratorData {
            current: range.left,
            right: range.right,
            comparator: Comparator::for_range(range.exclusive),
            state: EnumeratorState::Before,
        },
    )?;
    Ok(enumerator)
}

fn enumerator_current(vm: &mut Vm, this: Value, _args: &[Value]) -> Result<Value> {
    let data = get_enumerator(vm, this)?;
    check_enumerator(vm, &data)?;
    if data.state != EnumeratorState::Iterating {
        return Err(vm.raise(
            vm.core().type_error,
            "Invalid operation on Range::Enumerator",
        ));
    }
    Ok(data.current)
}

/// `Range::Enumerator#next`.
///
/// The protocol check runs before the DONE early return, so a finished
/// enumerator whose last cursor lost `succ` still raises `TypeError`
/// instead of answering `false`.
fn enumerator_next(vm: &mut Vm, this: Value, _args: &[Value]) -> Result<Value> {
    let mut data = get_enumerator(vm, this)?;
    check_enumerator(vm, &data)?;
    match data.state {
        EnumeratorState::Done => return Ok(Value::FALSE),
        EnumeratorState::Before => data.state = EnumeratorState::Iterating,
        EnumeratorState::Iterating => {
            data.current = vm.send_id(data.current, symbols::SUCC, &[])?;
        }
    }
    set_enumerator(vm, this, data)?;

    let in_range = vm.send_id(data.current, data.comparator.selector(), &[data.right])?;
    if in_range.is_truthy() {
        return Ok(Value::TRUE);
    }

    let mut done = get_enumerator(vm, this)?;
    done.state = EnumeratorState::Done;
    set_enumerator(vm, this, done)?;
    Ok(Value::FALSE)
}
