use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::{format_ident, quote};
use syn::{
    parse::Parser, punctuated::Punctuated, spanned::Spanned, FnArg, Ident, ItemFn, Pat,
    Signature, Token, Type,
};

/// Transform an asynchronous test into a synchronous one and inject
/// dependencies.
///
/// Injectable dependencies are [`rocket::local::asynchronous::Client`] and the
/// store the client's server runs against. Both share the same data.
///
/// By default the store is a [`crate::model::memory::MemoryStore`]. With
/// `#[backend_test(mongo)]` it is a [`crate::model::mongodb::MongoStore`] over
/// a scratch database at `db_uri`, which is dropped however the test ends; the
/// test is skipped if no server answers. Either store is seeded with
/// `Snapshot::example()` unless `empty` is also given.
#[proc_macro_attribute]
pub fn backend_test(args: TokenStream, input: TokenStream) -> TokenStream {
    let mut item_fn = match syn::parse::<ItemFn>(input) {
        Ok(item_fn) => item_fn,
        Err(err) => return err.into_compile_error().into(),
    };

    // Parse the options.
    let options = match Punctuated::<Ident, Token![,]>::parse_terminated.parse(args) {
        Ok(options) => options,
        Err(err) => return err.into_compile_error().into(),
    };
    let mut mongo = false;
    let mut empty = false;
    for option in &options {
        if option == "mongo" {
            mongo = true;
        } else if option == "empty" {
            empty = true;
        } else {
            return syn::Error::new(option.span(), "Expected `mongo` and/or `empty`")
                .into_compile_error()
                .into();
        }
    }

    // Extract type information and reject invalid function signatures.
    let test_args = match check_sig(item_fn.sig.clone(), mongo) {
        Ok(args) => args,
        Err(err) => {
            return err.into_compile_error().into();
        }
    };

    // Rename the future so the test can have its original name.
    let name = item_fn.sig.ident.clone();
    let new_name = format_ident!("{}_fut", name);
    item_fn.sig.ident = new_name.clone();

    let seed = if empty {
        quote! { crate::model::memory::Snapshot::default() }
    } else {
        quote! { crate::model::memory::Snapshot::example() }
    };

    let build_client = quote! {
        let rocket = crate::rocket_for_store(
            crate::model::store::Store::new(store.clone()),
            crate::config::Config::example(),
            crate::config::ApiKeys::example(),
        )
        .unwrap();
        let rocket_client = rocket::local::asynchronous::Client::tracked(rocket)
            .await
            .unwrap();
    };

    // Rewrite the test function.
    if mongo {
        quote! {
            #[test]
            fn #name() {
                /// Test setup.
                async fn setup() -> Option<(
                    rocket::local::asynchronous::Client,
                    crate::model::mongodb::MongoStore,
                    ::mongodb::Database,
                )> {
                    let db = crate::model::mongodb::testing::scratch_database().await?;
                    let store = crate::model::mongodb::MongoStore::from_db(&db);
                    store.import(#seed).await.unwrap();
                    #build_client
                    Some((rocket_client, store, db))
                }

                /// The test itself.
                #item_fn

                /// Test cleanup.
                async fn cleanup(db: ::mongodb::Database) {
                    db.drop(None).await.unwrap();
                }

                // Create an async runtime. We need a separate one for inside and
                // outside the `catch_unwind`.
                let outer_runtime = rocket::tokio::runtime::Builder::new_multi_thread()
                    .thread_name("test-setup-cleanup")
                    .worker_threads(1)
                    .enable_all()
                    .build()
                    .unwrap();
                let inner_runtime = rocket::tokio::runtime::Builder::new_multi_thread()
                    .thread_name("rocket-worker-test-thread")
                    .worker_threads(1)
                    .enable_all()
                    .build()
                    .unwrap();

                // Run the setup, skipping the test if there is no server.
                let Some((rocket_client, store, db)) = outer_runtime.block_on(setup()) else {
                    return;
                };

                // Run the test, catching any panics.
                // Use mutexes to safely transfer `!UnwindSafe` data.
                let client_mutex = std::sync::Mutex::new(rocket_client);
                let store_mutex = std::sync::Mutex::new(store);
                let runtime_mutex = std::sync::Mutex::new(inner_runtime);
                let result = std::panic::catch_unwind(|| {
                    let rocket_client = client_mutex.into_inner().unwrap();
                    let store = store_mutex.into_inner().unwrap();
                    let runtime = runtime_mutex.into_inner().unwrap();
                    runtime.block_on(#new_name(#(#test_args),*));
                });

                // Run the cleanup.
                outer_runtime.block_on(cleanup(db));

                // If the test panicked, re-raise the panic.
                if let Err(cause) = result {
                    std::panic::panic_any(cause);
                }
            }
        }
        .into()
    } else {
        quote! {
            #[test]
            fn #name() {
                /// Test setup.
                async fn setup() -> (rocket::local::asynchronous::Client, crate::model::memory::MemoryStore) {
                    let store = crate::model::memory::MemoryStore::from_snapshot(#seed).unwrap();
                    #build_client
                    (rocket_client, store)
                }

                /// The test itself.
                #item_fn

                let runtime = rocket::tokio::runtime::Builder::new_multi_thread()
                    .thread_name("rocket-worker-test-thread")
                    .worker_threads(1)
                    .enable_all()
                    .build()
                    .unwrap();
                runtime.block_on(async {
                    let (rocket_client, store) = setup().await;
                    #new_name(#(#test_args),*).await;
                });
            }
        }
        .into()
    }
}

/// Ensure the wrapped test is async, extract parameters to inject, and reject unknown parameters.
fn check_sig(sig: Signature, mongo: bool) -> Result<Vec<TokenStream2>, syn::Error> {
    if sig.asyncness.is_none() {
        return Err(syn::Error::new(sig.span(), "Test must be marked `async`"));
    }

    let store_type = if mongo { "MongoStore" } else { "MemoryStore" };
    let mut has_client = false;
    let mut has_store = false;
    let mut args = vec![];

    for input in &sig.inputs {
        if let FnArg::Typed(pat_type) = input {
            if let Pat::Ident(_) = &*pat_type.pat {
                if let Type::Path(type_path) = &*pat_type.ty {
                    if let Some(segment) = type_path.path.segments.last() {
                        if segment.ident == "Client" {
                            if has_client {
                                return Err(syn::Error::new(input.span(), "Test cannot accept more than one `rocket::local::asynchronous::Client`"));
                            }
                            has_client = true;
                            args.push(quote! { rocket_client });
                            continue;
                        } else if segment.ident == store_type {
                            if has_store {
                                return Err(syn::Error::new(
                                    input.span(),
                                    format!("Test cannot accept more than one `{store_type}`"),
                                ));
                            }
                            has_store = true;
                            args.push(quote! { store });
                            continue;
                        }
                    }
                }
            }
        }

        return Err(syn::Error::new(
            input.span(),
            format!("Expected one of `client_ident: Client` or `store_ident: {store_type}`"),
        ));
    }

    Ok(args)
}
