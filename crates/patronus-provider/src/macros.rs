/// Export the entry points of a provider library.
///
/// The argument is an expression evaluating to `Result<C, Failure>` where
/// `C: Check`. It runs once, inside `patronus_provider_init`.
#[macro_export]
macro_rules! export_provider {
    ($make:expr) => {
        #[unsafe(no_mangle)]
        pub extern "C" fn patronus_provider_version() -> ::std::ffi::c_int {
            $crate::PROVIDER_VERSION
        }

        #[unsafe(no_mangle)]
        pub unsafe extern "C" fn patronus_provider_init(
            out: *mut $crate::RawProvider,
        ) -> ::std::ffi::c_int {
            unsafe { $crate::init_into(out, || $make) }
        }
    };
}
