pub(crate) mod timeseries;
