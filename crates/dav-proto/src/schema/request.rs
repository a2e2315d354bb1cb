/*
 * SPDX-FileCopyrightText: 2020 Stalwart Labs LLC <hello@stalw.art>
 *
 * SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-SEL
 */

use super::{
    PropertyName,
    property::{LockScope, LockType},
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PropFind {
    PropName,
    AllProp(Vec<PropertyName>),
    Prop(Vec<PropertyName>),
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PropertyUpdate {
    pub instructions: Vec<Instruction>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Instruction {
    Set(PropertyValue),
    Remove(PropertyName),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertyValue {
    pub name: PropertyName,
    pub value: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LockInfo {
    pub lock_scope: LockScope,
    pub lock_type: LockType,
    pub owner: Option<String>,
}

impl PropertyUpdate {
    pub fn set(&self) -> impl Iterator<Item = &PropertyValue> {
        self.instructions.iter().filter_map(|i| match i {
            Instruction::Set(value) => Some(value),
            Instruction::Remove(_) => None,
        })
    }

    pub fn remove(&self) -> impl Iterator<Item = &PropertyName> {
        self.instructions.iter().filter_map(|i| match i {
            Instruction::Remove(name) => Some(name),
            Instruction::Set(_) => None,
        })
    }

    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }
}

impl Instruction {
    pub fn name(&self) -> &PropertyName {
        match self {
            Instruction::Set(value) => &value.name,
            Instruction::Remove(name) => name,
        }
    }
}
