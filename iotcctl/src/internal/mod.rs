// Copyright (c) Microsoft. All rights reserved.

pub mod common;
