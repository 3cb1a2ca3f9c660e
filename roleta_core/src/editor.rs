//! Splice operations on an ordered option list.
//!
//! Every operation keeps each option together with its confirmation content,
//! so the index an option ends up at is the index the draw reports for it.

use crate::{
    error::{WheelError, WheelResult},
    wheel::{ConfirmationContent, PrizeOption, Promotion},
};

fn out_of_range(index: usize, len: usize) -> WheelError {
    WheelError::invalid(format!("option index {index} out of range for {len} options"))
}

/// Insert at `index`; `index == len` appends.
pub fn insert<T>(items: &mut Vec<T>, index: usize, item: T) -> WheelResult<()> {
    if index > items.len() {
        return Err(out_of_range(index, items.len()));
    }
    items.insert(index, item);
    Ok(())
}

/// Insert a copy of `items[index]` right after it.
pub fn duplicate_in_place<T: Clone>(items: &mut Vec<T>, index: usize) -> WheelResult<()> {
    let copy = items.get(index).cloned().ok_or_else(|| out_of_range(index, items.len()))?;
    items.insert(index + 1, copy);
    Ok(())
}

pub fn remove<T>(items: &mut Vec<T>, index: usize) -> WheelResult<T> {
    if index >= items.len() {
        return Err(out_of_range(index, items.len()));
    }
    Ok(items.remove(index))
}

/// Drag `from` to position `to`, shifting the elements in between by one.
pub fn move_item<T>(items: &mut Vec<T>, from: usize, to: usize) -> WheelResult<()> {
    let len = items.len();
    if from >= len {
        return Err(out_of_range(from, len));
    }
    if to >= len {
        return Err(out_of_range(to, len));
    }
    let item = items.remove(from);
    items.insert(to, item);
    Ok(())
}

impl Promotion {
    pub fn push_option(&mut self, option: PrizeOption) {
        self.options.push(option);
    }

    pub fn insert_option(&mut self, index: usize, option: PrizeOption) -> WheelResult<()> {
        insert(&mut self.options, index, option)
    }

    pub fn duplicate_option(&mut self, index: usize) -> WheelResult<()> {
        duplicate_in_place(&mut self.options, index)
    }

    pub fn remove_option(&mut self, index: usize) -> WheelResult<PrizeOption> {
        remove(&mut self.options, index)
    }

    pub fn move_option(&mut self, from: usize, to: usize) -> WheelResult<()> {
        move_item(&mut self.options, from, to)
    }

    pub fn set_confirmation(&mut self, index: usize, content: ConfirmationContent) -> WheelResult<()> {
        let len = self.options.len();
        let option = self.options.get_mut(index).ok_or_else(|| out_of_range(index, len))?;
        option.confirmation = content;
        Ok(())
    }
}
