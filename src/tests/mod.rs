//! Test suite modules for the carbon ranker binary.
