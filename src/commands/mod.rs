// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

pub mod households;
pub mod users;
pub mod accounts;
pub mod cards;
pub mod categories;
pub mod tags;
pub mod transactions;
pub mod fixed;
pub mod thirdparty;
pub mod budgets;
pub mod reports;
pub mod doctor;
