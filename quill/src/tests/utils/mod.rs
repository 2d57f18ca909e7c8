// Copyright 2026 the Quill Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

mod env;

pub(crate) use env::TestEnv;
