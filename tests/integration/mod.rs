mod cli_contracts;
mod reconciler_properties;
mod store_connectivity;
mod support;
