//! Property-based tests for cdecl lowering.
//!
//! Random signatures built from lowerable types must produce C-compatible
//! thunks whose conversions consume exactly the C parameters they declare.

use std::sync::Arc;

use proptest::prelude::*;
use swift_java_abi::{
    CType, CdeclLowering, CodePrinter, KnownTypeKind, NominalKind, NominalTypeDecl, SwiftApiKind,
    SwiftFunctionSignature, SwiftParameter, SwiftType,
};

const SCALARS: [KnownTypeKind; 13] = [
    KnownTypeKind::Bool,
    KnownTypeKind::Int,
    KnownTypeKind::UInt,
    KnownTypeKind::Int8,
    KnownTypeKind::UInt8,
    KnownTypeKind::Int16,
    KnownTypeKind::UInt16,
    KnownTypeKind::Int32,
    KnownTypeKind::UInt32,
    KnownTypeKind::Int64,
    KnownTypeKind::UInt64,
    KnownTypeKind::Float,
    KnownTypeKind::Double,
];

fn point() -> SwiftType {
    SwiftType::nominal(Arc::new(NominalTypeDecl::new("MyModule", "Point", NominalKind::Struct)))
}

fn scalar() -> impl Strategy<Value = SwiftType> {
    proptest::sample::select(SCALARS.to_vec()).prop_map(SwiftType::known)
}

fn parameter_type() -> impl Strategy<Value = SwiftType> {
    let leaf = prop_oneof![
        scalar(),
        Just(SwiftType::known(KnownTypeKind::String)),
        Just(SwiftType::known(KnownTypeKind::UnsafeRawBufferPointer)),
        Just(SwiftType::known(KnownTypeKind::UnsafeMutableRawPointer)),
        scalar().prop_map(|element| SwiftType::known_generic(KnownTypeKind::UnsafeBufferPointer, vec![element])),
        scalar().prop_map(SwiftType::optional),
        Just(point()),
        Just(SwiftType::optional(point())),
        Just(SwiftType::Metatype(Box::new(point()))),
    ];
    leaf.prop_recursive(3, 12, 3, |inner| {
        proptest::collection::vec(inner, 0..=3).prop_map(SwiftType::Tuple)
    })
}

fn result_type() -> impl Strategy<Value = SwiftType> {
    let leaf = prop_oneof![
        Just(SwiftType::void()),
        scalar(),
        scalar().prop_map(SwiftType::optional),
        Just(SwiftType::known(KnownTypeKind::String)),
        Just(SwiftType::known(KnownTypeKind::UnsafeRawBufferPointer)),
        Just(point()),
    ];
    leaf.prop_recursive(2, 6, 3, |inner| {
        proptest::collection::vec(inner, 2..=3).prop_map(SwiftType::Tuple)
    })
}

fn signature() -> impl Strategy<Value = SwiftFunctionSignature> {
    (proptest::collection::vec(parameter_type(), 0..4), result_type()).prop_map(|(types, result)| {
        let parameters = types
            .into_iter()
            .enumerate()
            .map(|(index, ty)| SwiftParameter::labeled(format!("p{index}"), ty))
            .collect();
        SwiftFunctionSignature::new(parameters, result)
    })
}

fn render_thunk(signature: &SwiftFunctionSignature) -> String {
    let lowered = CdeclLowering::new().lower_function_signature(signature).unwrap();
    let mut printer = CodePrinter::new();
    lowered
        .cdecl_thunk(&mut printer, "swiftjava_MyModule_f", "f", SwiftApiKind::Function)
        .unwrap();
    printer.finalize()
}

proptest! {
    #[test]
    fn placeholder_count_matches_cdecl_parameters(signature in signature()) {
        let lowered = CdeclLowering::new().lower_function_signature(&signature).unwrap();
        prop_assert_eq!(lowered.parameters.len(), signature.parameters.len());
        for parameter in &lowered.parameters {
            prop_assert_eq!(parameter.conversion.placeholder_count(), parameter.cdecl_parameters.len());
        }
        prop_assert_eq!(lowered.result.conversion.placeholder_count(), 1);
    }

    #[test]
    fn cdecl_signature_is_c_representable(signature in signature()) {
        let lowered = CdeclLowering::new().lower_function_signature(&signature).unwrap();
        for parameter in lowered.all_lowered_parameters() {
            prop_assert!(CType::from_cdecl_type(&parameter.ty).is_ok(), "{}", parameter);
        }
        prop_assert!(CType::from_cdecl_type(&lowered.result.cdecl_result_type).is_ok());
        prop_assert!(lowered.c_function("swiftjava_MyModule_f").is_ok());
    }

    #[test]
    fn thunk_rendering_is_deterministic(signature in signature()) {
        let first = render_thunk(&signature);
        let second = render_thunk(&signature);
        prop_assert_eq!(&first, &second);
        prop_assert!(first.starts_with("@_cdecl(\"swiftjava_MyModule_f\")\n"));
    }
}
