pub(crate) mod autosave;
