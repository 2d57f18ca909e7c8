// Copyright 2026 the Quill Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

mod test_measure;
mod test_wrap;
mod utils;
